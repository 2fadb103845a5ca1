//! German city centre coordinates for realistic test fixtures.

use greenroute::model::Location;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct City {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl City {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn location(&self) -> Location {
        Location::new(self.lat, self.lng).with_address(self.name)
    }
}

pub const BERLIN: City = City::new("Berlin", 52.52, 13.405);
pub const MUNICH: City = City::new("Munich", 48.137, 11.575);
pub const HAMBURG: City = City::new("Hamburg", 53.5511, 9.9937);
pub const COLOGNE: City = City::new("Cologne", 50.9375, 6.9603);
