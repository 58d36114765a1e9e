pub mod checkout;
pub mod customer;
pub mod payment;
pub mod processor;
pub mod shipping;
pub mod validation;
