//! Simulated sensor node.
//!
//! Each sensor advances once per sweep and then reports its current value,
//! matching the bench firmware's read-then-send loop.

use gearlink_wire::SensorValue;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimSensor {
    /// Slow warm-up from 60 to 120 °C, then back to 60.
    OilTemperature(f32),
    /// +50 rpm per sweep, wrapping at 5000.
    PrimaryAxle(u16),
    /// +25 rpm per sweep, wrapping at 3000.
    SecondaryAxle(u16),
    /// +2.5 N·m per sweep from 100, reset past 400.
    GearboxTorque(f32),
    /// Occasional random spike that decays by 20% per sweep.
    BrakeTorque(f32),
    /// Small jitter around 15 °C, reset when it leaves 5..25.
    AirTemperature(f32),
}

impl SimSensor {
    /// The full bench, in firmware send order, at power-on values.
    pub fn bench() -> Vec<SimSensor> {
        vec![
            SimSensor::OilTemperature(60.0),
            SimSensor::PrimaryAxle(800),
            SimSensor::SecondaryAxle(300),
            SimSensor::GearboxTorque(100.0),
            SimSensor::BrakeTorque(0.0),
            SimSensor::AirTemperature(15.0),
        ]
    }

    pub fn step<R: Rng>(&mut self, rng: &mut R) {
        match self {
            SimSensor::OilTemperature(t) => {
                *t += 0.05;
                if *t > 120.0 {
                    *t = 60.0;
                }
            }
            SimSensor::PrimaryAxle(rpm) => *rpm = (*rpm + 50) % 5000,
            SimSensor::SecondaryAxle(rpm) => *rpm = (*rpm + 25) % 3000,
            SimSensor::GearboxTorque(torque) => {
                *torque += 2.5;
                if *torque > 400.0 {
                    *torque = 100.0;
                }
            }
            SimSensor::BrakeTorque(torque) => {
                if rng.random_ratio(1, 10) {
                    *torque = f32::from(rng.random_range(0u16..500));
                } else {
                    *torque *= 0.8;
                }
            }
            SimSensor::AirTemperature(t) => {
                *t += (rng.random::<f32>() - 0.5) * 0.2;
                if *t > 25.0 || *t < 5.0 {
                    *t = 15.0;
                }
            }
        }
    }

    pub fn value(&self) -> SensorValue {
        match *self {
            SimSensor::OilTemperature(t) => SensorValue::OilTemperature(t),
            SimSensor::PrimaryAxle(rpm) => SensorValue::PrimaryAxleSpeed(rpm),
            SimSensor::SecondaryAxle(rpm) => SensorValue::SecondaryAxleSpeed(rpm),
            SimSensor::GearboxTorque(torque) => SensorValue::GearboxTorque(torque),
            SimSensor::BrakeTorque(torque) => SensorValue::BrakeTorque(torque),
            SimSensor::AirTemperature(t) => SensorValue::AirTemperature(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn run(sensor: SimSensor, steps: usize) -> SimSensor {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sensor = sensor;
        for _ in 0..steps {
            sensor.step(&mut rng);
        }
        sensor
    }

    #[test]
    fn bench_covers_every_table_kind() {
        let kinds: Vec<_> = SimSensor::bench().iter().map(|s| s.value().kind()).collect();
        assert_eq!(kinds, gearlink_wire::SensorKind::KNOWN.to_vec());
    }

    #[test]
    fn axle_speeds_wrap() {
        assert_eq!(run(SimSensor::PrimaryAxle(800), 1), SimSensor::PrimaryAxle(850));
        assert_eq!(run(SimSensor::PrimaryAxle(4950), 1), SimSensor::PrimaryAxle(0));
        assert_eq!(run(SimSensor::SecondaryAxle(2975), 1), SimSensor::SecondaryAxle(0));
    }

    #[test]
    fn oil_temperature_ramps_and_resets() {
        let SimSensor::OilTemperature(t) = run(SimSensor::OilTemperature(60.0), 1) else {
            unreachable!()
        };
        assert!((t - 60.05).abs() < 1e-4);

        assert_eq!(
            run(SimSensor::OilTemperature(119.99), 1),
            SimSensor::OilTemperature(60.0)
        );
    }

    #[test]
    fn gearbox_torque_resets_past_400() {
        assert_eq!(
            run(SimSensor::GearboxTorque(100.0), 2),
            SimSensor::GearboxTorque(105.0)
        );
        assert_eq!(
            run(SimSensor::GearboxTorque(399.0), 1),
            SimSensor::GearboxTorque(100.0)
        );
    }

    #[test]
    fn brake_torque_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut sensor = SimSensor::BrakeTorque(0.0);
        let mut previous = 0.0f32;
        for _ in 0..1000 {
            sensor.step(&mut rng);
            let SimSensor::BrakeTorque(torque) = sensor else {
                unreachable!()
            };
            assert!((0.0..500.0).contains(&torque));
            // Either a fresh spike or a 20% decay of the last value.
            let decayed = (torque - previous * 0.8).abs() < 1e-3;
            assert!(decayed || torque.fract() == 0.0);
            previous = torque;
        }
    }

    #[test]
    fn air_temperature_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sensor = SimSensor::AirTemperature(15.0);
        for _ in 0..5000 {
            sensor.step(&mut rng);
            let SimSensor::AirTemperature(t) = sensor else {
                unreachable!()
            };
            assert!((5.0..=25.0).contains(&t));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let sweep = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut bench = SimSensor::bench();
            for _ in 0..50 {
                for sensor in &mut bench {
                    sensor.step(&mut rng);
                }
            }
            bench
        };
        assert_eq!(sweep(11), sweep(11));
    }
}
