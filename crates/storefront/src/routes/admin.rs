//! Admin panel route handlers.
//!
//! Read-only views over the catalog API's admin endpoints. Access requires a
//! session whose login reported the admin role; the API checks the token
//! again on every call.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use jewelbox_core::CurrencyCode;

use crate::api::{Customer, Order, Report};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::CurrentCustomer;
use crate::routes::products::format_price;
use crate::state::AppState;

fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |at| at.format("%d %b %Y").to_string())
}

// =============================================================================
// View Types
// =============================================================================

#[derive(Clone, Debug)]
pub struct CustomerRowView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub joined: String,
    pub orders: Option<u32>,
}

impl From<&Customer> for CustomerRowView {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.to_string(),
            name: customer.name.clone().unwrap_or_else(|| "-".to_string()),
            email: customer.email.clone().unwrap_or_else(|| "-".to_string()),
            phone: customer.phone.clone().unwrap_or_else(|| "-".to_string()),
            joined: format_date(customer.created_at),
            orders: customer.order_count,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OrderRowView {
    pub id: String,
    pub customer: String,
    pub item_count: usize,
    pub total: String,
    pub status: &'static str,
    pub open: bool,
    pub placed: String,
}

impl OrderRowView {
    fn new(order: &Order, currency: CurrencyCode) -> Self {
        Self {
            id: order.id.to_string(),
            customer: order
                .customer
                .as_ref()
                .map_or_else(|| "Guest".to_string(), |c| c.label()),
            item_count: order.items.len(),
            total: format_price(order.total, currency),
            status: order.status.label(),
            open: order.status.is_open(),
            placed: format_date(order.created_at),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TopProductView {
    pub name: String,
    pub sold: u64,
}

#[derive(Clone, Debug)]
pub struct MonthlyView {
    pub month: String,
    pub revenue: String,
    /// Bar width relative to the best month, 0 to 100.
    pub percent: u32,
}

#[derive(Clone, Debug)]
pub struct ReportView {
    pub total_sales: String,
    pub total_orders: u64,
    pub total_customers: u64,
    pub total_products: u64,
    pub top_products: Vec<TopProductView>,
    pub monthly: Vec<MonthlyView>,
}

impl ReportView {
    fn new(report: &Report, currency: CurrencyCode) -> Self {
        let best = report
            .monthly
            .iter()
            .map(|m| m.revenue)
            .max()
            .unwrap_or(Decimal::ZERO);

        Self {
            total_sales: format_price(report.total_sales, currency),
            total_orders: report.total_orders,
            total_customers: report.total_customers,
            total_products: report.total_products,
            top_products: report
                .top_products
                .iter()
                .map(|p| TopProductView {
                    name: p.name.clone(),
                    sold: p.sold,
                })
                .collect(),
            monthly: report
                .monthly
                .iter()
                .map(|m| MonthlyView {
                    month: m.month.clone(),
                    revenue: format_price(m.revenue, currency),
                    percent: bar_percent(m.revenue, best),
                })
                .collect(),
        }
    }
}

/// `value` as a whole percentage of `best`, clamped to 0..=100.
fn bar_percent(value: Decimal, best: Decimal) -> u32 {
    if best <= Decimal::ZERO || value <= Decimal::ZERO {
        return 0;
    }
    let percent = (value * Decimal::ONE_HUNDRED / best).round();
    u32::try_from(percent.mantissa()).map_or(100, |p| p.min(100))
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "admin/customers.html")]
pub struct CustomersTemplate {
    pub customer: Option<CurrentCustomer>,
    pub customers: Vec<CustomerRowView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub customer: Option<CurrentCustomer>,
    pub orders: Vec<OrderRowView>,
    pub open_count: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/reports.html")]
pub struct ReportsTemplate {
    pub customer: Option<CurrentCustomer>,
    pub report: ReportView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Customer list.
#[instrument(skip(state, admin))]
pub async fn customers(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<CustomersTemplate, AppError> {
    let customers = state.api().admin_customers(&admin.token()).await?;

    Ok(CustomersTemplate {
        customer: Some(admin),
        customers: customers.iter().map(CustomerRowView::from).collect(),
    })
}

/// Order list, newest first.
#[instrument(skip(state, admin))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<OrdersTemplate, AppError> {
    let mut orders = state.api().admin_orders(&admin.token()).await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let currency = state.config().currency;
    let rows: Vec<OrderRowView> = orders.iter().map(|o| OrderRowView::new(o, currency)).collect();

    Ok(OrdersTemplate {
        customer: Some(admin),
        open_count: rows.iter().filter(|row| row.open).count(),
        orders: rows,
    })
}

/// Sales report.
#[instrument(skip(state, admin))]
pub async fn reports(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<ReportsTemplate, AppError> {
    let report = state.api().admin_reports(&admin.token()).await?;

    Ok(ReportsTemplate {
        customer: Some(admin),
        report: ReportView::new(&report, state.config().currency),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jewelbox_core::OrderStatus;

    use super::*;

    #[test]
    fn test_bar_percent() {
        let best = Decimal::from(200);
        assert_eq!(bar_percent(Decimal::from(200), best), 100);
        assert_eq!(bar_percent(Decimal::from(50), best), 25);
        assert_eq!(bar_percent(Decimal::ZERO, best), 0);
        assert_eq!(bar_percent(Decimal::from(10), Decimal::ZERO), 0);
    }

    #[test]
    fn test_report_view() {
        let report: Report = serde_json::from_str(
            r#"{
                "totalRevenue": 150000,
                "totalOrders": 12,
                "totalUsers": 40,
                "totalProducts": 85,
                "topProducts": [{"name": "Temple Necklace", "totalSold": 7}],
                "monthlySales": [{"_id": "2024-01", "total": 50000}, {"_id": "2024-02", "total": 100000}]
            }"#,
        )
        .unwrap();
        let view = ReportView::new(&report, CurrencyCode::INR);

        assert_eq!(view.total_sales, "₹150,000.00");
        assert_eq!(view.total_customers, 40);
        assert_eq!(view.top_products[0].sold, 7);
        assert_eq!(view.monthly[0].percent, 50);
        assert_eq!(view.monthly[1].percent, 100);
    }

    #[test]
    fn test_order_row_labels_guest_and_status() {
        let order: Order = serde_json::from_str(
            r#"{"_id": "o1", "orderItems": [{}, {}], "totalPrice": 2400, "status": "shipped"}"#,
        )
        .unwrap();
        let row = OrderRowView::new(&order, CurrencyCode::INR);

        assert_eq!(row.customer, "Guest");
        assert_eq!(row.item_count, 2);
        assert_eq!(row.total, "₹2,400.00");
        assert_eq!(row.status, OrderStatus::Shipped.label());
        assert_eq!(row.open, OrderStatus::Shipped.is_open());
        assert_eq!(row.placed, "-");
    }
}
