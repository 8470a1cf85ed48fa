use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Car, Order};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithCar {
    pub order: Order,
    pub car: Car,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithCar>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub orders: Vec<Order>,
    /// Set when the confirmation email could not be sent; the checkout
    /// itself still succeeded.
    pub mail_warning: Option<String>,
}
