//! EIRP bounds for a CBSD
//!
//! All values are dBm. Bounds depend on the radio capabilities (power
//! range, antenna gain, port count) and the grant bandwidth.

use dp_dbi::{Channel, DbCbsd};

pub const MHZ: i64 = 1_000_000;

/// Regulatory EIRP ceiling per channel
pub const MAX_EIRP_DBM: f64 = 37.0;
/// EIRP assumed where no channel covers a sub-unit
pub const NO_CHANNEL_EIRP_DBM: f64 = -137.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EirpCalculator {
    min_power: f64,
    max_power: f64,
    antenna_gain: f64,
    number_of_ports: f64,
}

impl EirpCalculator {
    pub fn new(cbsd: &DbCbsd) -> Self {
        EirpCalculator {
            min_power: cbsd.min_power.unwrap_or_default(),
            max_power: cbsd.max_power.unwrap_or_default(),
            antenna_gain: cbsd.antenna_gain_dbi.unwrap_or_default(),
            number_of_ports: cbsd.number_of_ports.unwrap_or_default() as f64,
        }
    }

    fn calc(&self, power: f64, bandwidth_hz: i64) -> f64 {
        let bandwidth_mhz = bandwidth_hz as f64 / MHZ as f64;
        power + self.antenna_gain - 10.0 * (bandwidth_mhz / self.number_of_ports).log10()
    }

    /// Minimum EIRP a channel must allow to be usable at `bandwidth_hz`
    pub fn calc_lower_bound(&self, bandwidth_hz: i64) -> f64 {
        self.calc(self.min_power, bandwidth_hz).ceil()
    }

    /// Maximum EIRP the radio can reach at `bandwidth_hz`
    pub fn calc_upper_bound(&self, bandwidth_hz: i64) -> f64 {
        self.calc(self.max_power, bandwidth_hz).floor()
    }

    /// Maximum EIRP to request for a grant spanning `[low_hz, high_hz]`
    ///
    /// The range is split into 1 MHz sub-units, each taking the highest
    /// EIRP among the channels covering it. The worst sub-unit caps the
    /// result, as do the radio capabilities and the regulatory ceiling.
    pub fn calc_upper_bound_for_range(&self, channels: &[Channel], low_hz: i64, high_hz: i64) -> f64 {
        let units = ((high_hz - low_hz) / MHZ).max(0) as usize;
        let mut eirps = vec![NO_CHANNEL_EIRP_DBM; units];

        for channel in channels {
            let low = channel.low_frequency_hz.max(low_hz);
            let high = channel.high_frequency_hz.min(high_hz);
            if low >= high {
                continue;
            }
            let begin = ((low - low_hz).div_euclid(MHZ)) as usize;
            let end = (-(-(high - low_hz)).div_euclid(MHZ)) as usize;
            for eirp in &mut eirps[begin..end.min(units)] {
                *eirp = eirp.max(channel.max_eirp);
            }
        }

        eirps
            .into_iter()
            .fold(self.calc_upper_bound(high_hz - low_hz).min(MAX_EIRP_DBM), f64::min)
    }
}
