use serde::Serialize;

use crate::domain::topology::snapshot::TopologySnapshot;

/// Figures derived from a snapshot; recomputed on every refresh, never stored on their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TopologyMetrics {
    pub gpu_count: usize,

    /// Connections whose endpoints both exist in the snapshot.
    pub connection_count: usize,

    /// Rounded to the nearest integer, halves away from zero; 0 without GPUs.
    pub average_temperature: i32,
}

impl TopologyMetrics {
    pub fn compute(snapshot: &TopologySnapshot) -> TopologyMetrics {
        TopologyMetrics {
            gpu_count: snapshot.gpus.len(),
            connection_count: snapshot.valid_connections().count(),
            average_temperature: average_temperature(snapshot.gpus.iter().map(|gpu| gpu.temperature)),
        }
    }
}

pub fn average_temperature(temperatures: impl IntoIterator<Item = i32>) -> i32 {
    let (sum, count) = temperatures.into_iter().fold((0i64, 0i64), |(sum, count), t| (sum + t as i64, count + 1));

    if count == 0 {
        return 0;
    }

    (sum as f64 / count as f64).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_empty_set_is_zero() {
        assert_eq!(average_temperature(Vec::new()), 0);
    }

    #[test]
    fn test_average_rounds_half_up() {
        // 294 / 4 = 73.5
        assert_eq!(average_temperature(vec![72, 75, 78, 69]), 74);
    }

    #[test]
    fn test_average_rounds_down_below_half() {
        assert_eq!(average_temperature(vec![70, 71, 71]), 71);
        assert_eq!(average_temperature(vec![60]), 60);
    }
}
