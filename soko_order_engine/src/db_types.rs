use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soko_common::Shillings;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------        OrderId        -------------------------------------------------------
/// The public, opaque identifier of an order. This is the id buyers see and the reference attached to payment
/// requests; the numeric row id never leaves the engine.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// The fulfillment status of an order. Payment state is tracked separately; an order only leaves `Pending` once its
/// payment settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Newly created, payment not yet settled.
    Pending,
    /// Payment has settled; the seller is preparing the order.
    Processing,
    /// Handed to the courier.
    Shipped,
    /// Received by the buyer. Terminal. Inventory is consumed and sellers are credited on entry.
    Delivered,
    /// Abandoned by either party. Terminal. Inventory reservations are released on entry.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentStatus     -------------------------------------------------------
/// The top-level payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

//--------------------------------------    PaymentSubStatus    ------------------------------------------------------
/// The detailed state of the payment attempt itself. This is the field the settlement idempotency guard is keyed on:
/// anything other than `Pending` is terminal, and a settlement event arriving for a terminal payment is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentSubStatus {
    Pending,
    Completed,
    Failed,
    /// The payer explicitly dismissed the payment prompt.
    Cancelled,
}

impl PaymentSubStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentSubStatus::Pending)
    }
}

impl Display for PaymentSubStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentSubStatus::Pending => write!(f, "Pending"),
            PaymentSubStatus::Completed => write!(f, "Completed"),
            PaymentSubStatus::Failed => write!(f, "Failed"),
            PaymentSubStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

//--------------------------------------     ProductStatus     -------------------------------------------------------
/// Availability state of a product. `Pending` means some active order holds a reservation on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ProductStatus {
    Available,
    Pending,
    Sold,
}

impl Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductStatus::Available => write!(f, "Available"),
            ProductStatus::Pending => write!(f, "Pending"),
            ProductStatus::Sold => write!(f, "Sold"),
        }
    }
}

//--------------------------------------      ListingType      -------------------------------------------------------
/// How a product is listed. Donation items always contribute zero to an order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ListingType {
    Resale,
    Donation,
}

impl Display for ListingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingType::Resale => write!(f, "Resale"),
            ListingType::Donation => write!(f, "Donation"),
        }
    }
}

//--------------------------------------         Role          -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Buyer => write!(f, "Buyer"),
            Role::Seller => write!(f, "Seller"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buyer" => Ok(Self::Buyer),
            "Seller" => Ok(Self::Seller),
            "Admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------       Payment         -------------------------------------------------------
/// The payment sub-record embedded in every order. All fields except `sub_status` are absent until a payment has
/// been initiated for the order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    /// The provider-issued reference correlating the push with its eventual callback or query result.
    pub checkout_ref: Option<String>,
    pub merchant_ref: Option<String>,
    /// The amount requested from the payer.
    #[sqlx(rename = "payment_amount")]
    #[serde(rename = "payment_amount")]
    pub amount: Option<Shillings>,
    pub payer_phone: Option<String>,
    /// The provider's receipt number, recorded on successful settlement.
    pub receipt_number: Option<String>,
    #[sqlx(rename = "payment_sub_status")]
    #[serde(rename = "payment_sub_status")]
    pub sub_status: PaymentSubStatus,
    pub initiated_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub buyer_id: String,
    pub shipping_address: String,
    pub shipping_fee: Shillings,
    /// Immutable after creation. This is what the payer is charged; recomputing it later would desynchronise the
    /// order from the payment.
    pub total_amount: Shillings,
    pub order_status: OrderStatusType,
    pub payment_status: PaymentStatus,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderItem        -------------------------------------------------------
/// A line item. Name, price and category are snapshots taken at order creation, so later catalog edits cannot
/// change what the buyer agreed to pay.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    /// Row id of the owning order.
    pub order_id: i64,
    pub product_id: String,
    pub seller_id: String,
    pub name: String,
    pub price: Shillings,
    pub listing_type: ListingType,
    pub category: String,
}

//--------------------------------------       NewOrder        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub seller_id: String,
    pub name: String,
    pub price: Shillings,
    pub listing_type: ListingType,
    pub category: String,
}

impl From<&Product> for NewOrderItem {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            seller_id: product.seller_id.clone(),
            name: product.name.clone(),
            price: product.charged_price(),
            listing_type: product.listing_type,
            category: product.category.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub buyer_id: String,
    pub shipping_address: String,
    pub shipping_fee: Shillings,
    pub total_amount: Shillings,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, buyer_id: String, shipping_address: String, shipping_fee: Shillings) -> Self {
        Self { order_id, buyer_id, shipping_address, shipping_fee, total_amount: shipping_fee, items: Vec::new() }
    }

    /// Append an item and fold its price into the total. Donation items carry a zero price already.
    pub fn add_item(&mut self, item: NewOrderItem) {
        self.total_amount += item.price;
        self.items.push(item);
    }
}

//--------------------------------------       Product         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub price: Shillings,
    pub listing_type: ListingType,
    pub category: String,
    pub status: ProductStatus,
    /// Set once, when the product is consumed at delivery.
    pub is_ordered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price this product contributes to an order total.
    pub fn charged_price(&self) -> Shillings {
        match self.listing_type {
            ListingType::Resale => self.price,
            ListingType::Donation => Shillings::from(0),
        }
    }
}

/// A new marketplace listing, as submitted by a seller. New listings always start out `Available`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub price: Shillings,
    pub listing_type: ListingType,
    pub category: String,
}

//--------------------------------------         User          -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub role: Role,
    /// Running seller income counter, incremented exactly once per order item on delivery.
    pub total_income: Shillings,
    pub total_exchanges: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       CartItem        -------------------------------------------------------
/// One line of a buyer's cart snapshot. Quantity is always 1 per distinct product; adding a product twice bumps a
/// counter on the existing line instead of creating a second one.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
}

//--------------------------------------     PaymentResult     -------------------------------------------------------
/// A settlement event from either reconciliation source (provider callback or explicit status poll), already mapped
/// from provider codes to engine terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentResult {
    Success { receipt_number: Option<String>, amount: Option<Shillings> },
    CancelledByPayer,
    Failed { code: i64, description: String },
}

//--------------------------------------  SettlementOutcome    -------------------------------------------------------
/// What the reconciliation engine did with a settlement event.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// This event won the settlement race and its result was recorded.
    Applied(Order),
    /// The payment was already terminal; the recorded order is returned unchanged.
    AlreadySettled(Order),
    /// No order carries this checkout reference. Acknowledged as a no-op, never an error.
    UnknownOrder(String),
}

impl SettlementOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            SettlementOutcome::Applied(o) | SettlementOutcome::AlreadySettled(o) => Some(o),
            SettlementOutcome::UnknownOrder(_) => None,
        }
    }
}

//--------------------------------------      ActingUser       -------------------------------------------------------
/// The authenticated principal driving a fulfillment transition, used for the seller-or-admin check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser {
    pub id: String,
    pub role: Role,
}

impl ActingUser {
    pub fn new<S: Into<String>>(id: S, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
