use crate::model::{NotWornReason, TelemetrySample, Wear};

/// Decides whether the sock is on the foot and reporting trustworthy vitals.
///
/// Checks run in a fixed order: total absence first, then partial vitals,
/// then the double-zero off-body pattern, then the explicit device flag.
/// Any check that fires yields `NotWorn`.
pub fn classify_worn(sample: &TelemetrySample) -> Wear {
    if sample.is_empty() {
        return Wear::NotWorn(NotWornReason::NoData);
    }

    let (heart_rate, oxygen) = match (sample.heart_rate, sample.oxygen_saturation) {
        (Some(hr), Some(o2)) => (hr, o2),
        _ => return Wear::NotWorn(NotWornReason::MissingVitals),
    };

    // A sock on a live foot never reads 0/0; the device uses it for off-body.
    if heart_rate == 0 && oxygen == 0 {
        return Wear::NotWorn(NotWornReason::ZeroVitals);
    }

    if sample.off_body == Some(true) {
        return Wear::NotWorn(NotWornReason::ReportedOffBody);
    }

    Wear::Worn
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn sample(hr: Option<u32>, o2: Option<u32>) -> TelemetrySample {
        TelemetrySample {
            heart_rate: hr,
            oxygen_saturation: o2,
            movement: Some(1),
            sleep_state: Some(1),
            off_body: Some(false),
        }
    }

    #[test]
    fn test_empty_sample_not_worn() {
        assert_eq!(
            classify_worn(&TelemetrySample::default()),
            Wear::NotWorn(NotWornReason::NoData)
        );
    }

    #[test]
    fn test_both_vitals_absent_not_worn() {
        let mut s = sample(None, None);
        assert!(!classify_worn(&s).is_worn());

        s.off_body = None;
        s.sleep_state = None;
        assert_eq!(
            classify_worn(&s),
            Wear::NotWorn(NotWornReason::MissingVitals)
        );
    }

    #[test]
    fn test_partial_vitals_not_worn() {
        assert_eq!(
            classify_worn(&sample(Some(120), None)),
            Wear::NotWorn(NotWornReason::MissingVitals)
        );
        assert_eq!(
            classify_worn(&sample(None, Some(98))),
            Wear::NotWorn(NotWornReason::MissingVitals)
        );
    }

    #[test]
    fn test_double_zero_not_worn_even_with_movement() {
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let s = TelemetrySample {
                heart_rate: Some(0),
                oxygen_saturation: Some(0),
                movement: Some(rng.gen_range(0..100)),
                sleep_state: Some(rng.gen_range(0..10)),
                off_body: None,
            };
            assert_eq!(classify_worn(&s), Wear::NotWorn(NotWornReason::ZeroVitals));
        }
    }

    #[test]
    fn test_single_zero_is_still_worn() {
        // Only the combination is the off-body signal.
        assert_eq!(classify_worn(&sample(Some(0), Some(95))), Wear::Worn);
        assert_eq!(classify_worn(&sample(Some(110), Some(0))), Wear::Worn);
    }

    #[test]
    fn test_off_body_flag_wins_over_good_vitals() {
        let mut s = sample(Some(120), Some(98));
        s.off_body = Some(true);
        assert_eq!(
            classify_worn(&s),
            Wear::NotWorn(NotWornReason::ReportedOffBody)
        );
    }

    #[test]
    fn test_normal_reading_worn() {
        assert_eq!(classify_worn(&sample(Some(88), Some(97))), Wear::Worn);

        let mut s = sample(Some(88), Some(97));
        s.off_body = None;
        assert_eq!(classify_worn(&s), Wear::Worn);
    }
}
