use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A confirmed or in-flight vehicle test reservation. A booking whose status
/// is neither `cancelled` nor `failed` owns exactly one slot entry for its
/// `(test_date, time_slot)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub contact_number: String,
    pub test_date: NaiveDate,
    pub time_slot: String,
    pub total_price: String,
    pub make_and_model: String,
    pub registration_no: String,
    pub class_selection: VehicleClass,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_id: String,
    pub capture_id: Option<String>,
    pub refund_id: Option<String>,
    pub refund_status: Option<RefundStatus>,
    pub refund_amount: Option<f64>,
    pub refund_reason: Option<String>,
    pub refund_date: Option<NaiveDate>,
    pub booked_by: BookedBy,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum VehicleClass {
    #[serde(rename = "class4")]
    Class4,
    #[serde(rename = "class7")]
    Class7,
}

impl VehicleClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Class4 => "class4",
            VehicleClass::Class7 => "class7",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "class4" => Some(VehicleClass::Class4),
            "class7" => Some(VehicleClass::Class7),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum PaymentMethod {
    #[serde(rename = "Payment on the day")]
    PaymentOnTheDay,
    #[serde(rename = "Cash")]
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::PaymentOnTheDay => "Payment on the day",
            PaymentMethod::Cash => "Cash",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Payment on the day" => Some(PaymentMethod::PaymentOnTheDay),
            "Cash" => Some(PaymentMethod::Cash),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            "cancelled" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Completed,
    Failed,
    Reversed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Completed => "completed",
            RefundStatus::Failed => "failed",
            RefundStatus::Reversed => "reversed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RefundStatus::Pending),
            "completed" => Some(RefundStatus::Completed),
            "failed" => Some(RefundStatus::Failed),
            "reversed" => Some(RefundStatus::Reversed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookedBy {
    Admin,
    Customer,
}

impl BookedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookedBy::Admin => "admin",
            BookedBy::Customer => "customer",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => BookedBy::Admin,
            _ => BookedBy::Customer,
        }
    }
}
