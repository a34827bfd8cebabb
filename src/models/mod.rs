pub mod activity;
pub mod booking;
pub mod contact;
pub mod payment_method;
pub mod service;

pub use activity::{ActivityEvent, ActivityKind};
pub use booking::{
    Booking, BookingEvent, BookingStatus, BookingWithService, Frequency, PaymentStatus,
    TransitionError,
};
pub use contact::{ContactMessage, InquiryType};
pub use payment_method::{
    BankTransferSettings, PaymentMethod, PaymentMethodType, PaymentSettings, PaypalSettings,
};
pub use service::Service;
