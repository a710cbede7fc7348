#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::models::{JulianDate, ScanWindow, J2000_JD, UNIX_EPOCH_JD};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_jd_new() {
        let jd = JulianDate::new(2_451_545.0);
        assert_eq!(jd.value(), 2_451_545.0);
    }

    #[test]
    fn test_jd_from_f64() {
        let jd: JulianDate = 2_460_000.5.into();
        assert_eq!(jd.value(), 2_460_000.5);
    }

    #[test]
    fn test_jd_ordering() {
        let jd1 = JulianDate::new(2_450_000.0);
        let jd2 = JulianDate::new(2_451_000.0);

        assert!(jd1 < jd2);
        assert!(jd2 > jd1);
    }

    #[test]
    fn test_unix_epoch_date() {
        let jd = JulianDate::from_date(date(1970, 1, 1));
        assert_eq!(jd.value(), UNIX_EPOCH_JD);
        assert!(jd.to_unix_timestamp().abs() < 1e-9);
    }

    #[test]
    fn test_j2000_midnight() {
        // J2000.0 is noon, so midnight of the same day is half a day earlier
        let jd = JulianDate::from_date(date(2000, 1, 1));
        assert_eq!(jd.value(), J2000_JD - 0.5);
    }

    #[test]
    fn test_known_scan_start() {
        // 2026-01-01 00:00 UTC
        let jd = JulianDate::from_date(date(2026, 1, 1));
        assert_eq!(jd.value(), 2_461_041.5);
    }

    #[test]
    fn test_date_roundtrip_is_exact() {
        let mut d = date(1899, 12, 25);
        for _ in 0..2000 {
            let jd = JulianDate::from_date(d);
            assert_eq!(jd.to_date(), d);
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_to_date_within_day() {
        let jd = JulianDate::from_date(date(2027, 3, 22)).add_days(0.75);
        assert_eq!(jd.to_date(), date(2027, 3, 22));
    }

    #[test]
    fn test_before_unix_epoch() {
        let jd = JulianDate::from_date(date(1969, 12, 31)).add_days(0.5);
        assert_eq!(jd.to_date(), date(1969, 12, 31));
    }

    #[test]
    fn test_datetime_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2026, 5, 15, 18, 30, 0).unwrap();
        let jd = JulianDate::from_datetime(dt);
        let back = jd.to_datetime();
        assert!((back.timestamp() - dt.timestamp()).abs() <= 1);
    }

    #[test]
    fn test_days_since() {
        let a = JulianDate::from_date(date(2026, 5, 20));
        let b = JulianDate::from_date(date(2026, 5, 15));
        assert_eq!(a.days_since(b), 5.0);
        assert_eq!(b.days_since(a), -5.0);
    }

    #[test]
    fn test_window_len_and_days() {
        let window = ScanWindow::new(date(2026, 2, 27), date(2026, 3, 2));
        assert_eq!(window.len(), 4);
        let days: Vec<_> = window.days().collect();
        assert_eq!(
            days,
            vec![
                date(2026, 2, 27),
                date(2026, 2, 28),
                date(2026, 3, 1),
                date(2026, 3, 2)
            ]
        );
    }

    #[test]
    fn test_window_single_day() {
        let window = ScanWindow::new(date(2027, 3, 22), date(2027, 3, 22));
        assert_eq!(window.len(), 1);
        assert!(window.contains(date(2027, 3, 22)));
        assert!(!window.contains(date(2027, 3, 23)));
    }

    #[test]
    fn test_window_inverted_is_empty() {
        let window = ScanWindow::new(date(2027, 1, 2), date(2027, 1, 1));
        assert!(window.is_empty());
        assert_eq!(window.days().count(), 0);
    }
}
