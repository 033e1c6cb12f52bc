pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

pub use config::Config;
pub use error::{AppError, AppResult};

use repository::{LocationRepository, TripRepository, UserRepository, VehicleRepository};
use services::{geocoder::DynGeocoder, AccountService, LocationService, TripService};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub trips: Arc<TripService>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    /// Wire the services over a single store implementing every repository.
    pub fn new<R>(config: Config, store: Arc<R>, geocoder: DynGeocoder) -> Self
    where
        R: UserRepository + VehicleRepository + LocationRepository + TripRepository + 'static,
    {
        let locations = LocationService::new(store.clone(), geocoder);
        let trips = TripService::new(store.clone(), store.clone(), store.clone(), locations);
        let accounts = AccountService::new(store.clone(), store, &config);

        Self {
            config,
            trips: Arc::new(trips),
            accounts: Arc::new(accounts),
        }
    }
}
