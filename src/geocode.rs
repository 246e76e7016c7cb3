use std::{thread::sleep, time::Duration};

use anyhow::Result;
use geo::Point;
use serde::Deserialize;
use ureq::Agent;

const ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

pub struct Geocoder {
    agent: Agent,
    key: String,
    delay: Duration,
}

#[derive(Debug, PartialEq)]
pub enum Lookup {
    Located(Point),
    // the provider's status, e.g. ZERO_RESULTS
    Unresolved(String),
}

impl Geocoder {
    pub fn new(key: String, delay: Duration) -> Self {
        Self {
            agent: Agent::new(),
            key,
            delay,
        }
    }

    // one provider call per address. Anything the provider answered comes
    // back as a Lookup; transport failures bubble up for the caller's
    // --on-error policy to decide.
    pub fn lookup(&self, address: &str) -> Result<Lookup> {
        let response = self
            .agent
            .get(ENDPOINT)
            .query("address", address)
            .query("key", &self.key)
            .call();

        // the provider rate limits, failed calls included
        sleep(self.delay);

        let response: Response = response?.into_json()?;
        Ok(response.refine())
    }
}

#[derive(Deserialize)]
struct Response {
    status: String,
    #[serde(default)]
    results: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

impl Response {
    fn refine(self) -> Lookup {
        if self.status == "OK" {
            // the top hit is trusted as-is, ambiguous addresses and all
            if let Some(top) = self.results.into_iter().next() {
                let location = top.geometry.location;
                return Lookup::Located(Point::new(location.lng, location.lat));
            }
        }

        Lookup::Unresolved(self.status)
    }
}
