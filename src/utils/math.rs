pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if value - min == 0.0 {
        0.0
    } else {
        (value - min) / (max - min)
    }
}

pub fn constrain(value: f64, min: f64, max: f64) -> f64 {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

pub fn constrain_normalized(value: f64, min: f64, max: f64) -> f64 {
    constrain(normalize(value, min, max), 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalize(0.0, 0.0, 10.0), 0.0);
        assert_eq!(normalize(20.0, 0.0, 10.0), 2.0);
    }

    #[test]
    fn test_normalize_degenerate_range_at_minimum() {
        assert_eq!(normalize(3.0, 3.0, 3.0), 0.0);
    }

    #[test]
    fn test_constrain_normalized() {
        assert_eq!(constrain_normalized(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(constrain_normalized(15.0, 0.0, 10.0), 1.0);
        assert_eq!(constrain_normalized(2.5, 0.0, 10.0), 0.25);
    }
}
