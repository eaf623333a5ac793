pub mod currency;
pub mod invoice;
