pub mod location;
pub mod trip;
pub mod user;
pub mod vehicle;
