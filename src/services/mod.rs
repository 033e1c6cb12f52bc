pub mod account;
pub mod geocoder;
pub mod location;
pub mod trip;

pub use account::AccountService;
pub use location::LocationService;
pub use trip::TripService;
