//! Serde helpers shared by the configuration domains

/// Durations as seconds. Whole seconds are written as integers; fractional
/// values such as `0.5` are accepted and kept.
pub mod serde_duration {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else {
            serializer.serialize_f64(duration.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds)
            .map_err(|_| D::Error::custom(format!("invalid duration: {} seconds", seconds)))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::serde_duration")]
        pause: Duration,
    }

    #[test]
    fn test_whole_and_fractional_seconds() {
        let whole: Wrapper = serde_yaml::from_str("pause: 2").unwrap();
        assert_eq!(whole.pause, Duration::from_secs(2));

        let half: Wrapper = serde_yaml::from_str("pause: 0.5").unwrap();
        assert_eq!(half.pause, Duration::from_millis(500));
        assert_eq!(serde_yaml::to_string(&half).unwrap().trim(), "pause: 0.5");
    }

    #[test]
    fn test_negative_duration_rejected() {
        assert!(serde_yaml::from_str::<Wrapper>("pause: -1").is_err());
    }
}
