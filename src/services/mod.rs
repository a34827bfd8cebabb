pub mod activity;
pub mod booking;
pub mod contact;
pub mod mailer;
pub mod notifications;
pub mod reference;
pub mod session;
pub mod validation;
