/// Округляет денежное значение до 2 знаков (как в отчётах)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(1380.0), 1380.0);
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(10.0 / 3.0), 3.33);
        assert_eq!(round2(-1.239), -1.24);
    }
}
