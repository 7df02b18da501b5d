//! ==============================================================================
//! simulator.rs - stand-in for the distance sensor device
//! ==============================================================================
//!
//! purpose:
//!     lets the relay and dashboard be exercised without hardware. behaves
//!     like the device: ask /api/status, and only while the system is on
//!     post a reading.
//!
//! readings:
//!     distance is uniform in [0, 15) cm, the led is lit when something is
//!     closer than 10 cm.
//!
//! ==============================================================================

use anyhow::Result;
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::client::RelayClient;
use crate::domain::SystemStatus;

/// readings closer than this light the led
pub const DETECTION_THRESHOLD_CM: f64 = 10.0;

const MAX_DISTANCE_CM: f64 = 15.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulatedReading {
    pub distance: f64,
    pub led_state: u8,
}

impl SimulatedReading {
    pub fn from_distance(distance: f64) -> Self {
        let led_state = if distance < DETECTION_THRESHOLD_CM { 1 } else { 0 };
        Self { distance, led_state }
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::from_distance(rng.gen_range(0.0..MAX_DISTANCE_CM))
    }
}

/// one device cycle; returns whether a reading was sent
pub async fn report_once<R: Rng>(client: &RelayClient, rng: &mut R) -> Result<bool> {
    let status = client.status().await?;
    if status == SystemStatus::Off {
        debug!("[SIM] System is off, holding reading");
        return Ok(false);
    }

    let reading = SimulatedReading::random(rng);
    let reply = client.post_reading(reading.distance, reading.led_state).await?;
    info!(
        "[SIM] Distance: {:.2} cm | LED: {} | {}",
        reading.distance, reading.led_state, reply.message
    );
    Ok(true)
}

/// report forever, logging failures and carrying on
pub async fn run(client: RelayClient, interval: Duration) -> Result<()> {
    info!("[SIM] Reporting to {} every {:?}", client.base_url(), interval);
    let mut rng = rand::rngs::StdRng::from_entropy();

    loop {
        if let Err(e) = report_once(&client, &mut rng).await {
            warn!("[SIM] ⚠ Report failed: {:#}", e);
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_follows_threshold() {
        assert_eq!(SimulatedReading::from_distance(9.99).led_state, 1);
        assert_eq!(SimulatedReading::from_distance(10.0).led_state, 0);
        assert_eq!(SimulatedReading::from_distance(0.0).led_state, 1);
    }

    #[test]
    fn random_readings_stay_in_range() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let reading = SimulatedReading::random(&mut rng);
            assert!((0.0..MAX_DISTANCE_CM).contains(&reading.distance));
            assert_eq!(reading.led_state == 1, reading.distance < DETECTION_THRESHOLD_CM);
        }
    }
}
