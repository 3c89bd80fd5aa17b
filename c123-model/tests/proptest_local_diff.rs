use c123_model::{local_diff, ControlFlags, NeighborhoodSample, Orientation, SampleFormat};
use proptest::prelude::*;

fn any_flags() -> impl Strategy<Value = ControlFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>())
        .prop_map(|(a, b, c)| ControlFlags::new(a, b, c))
}

fn any_orientation() -> impl Strategy<Value = Orientation> {
    prop_oneof![Just(Orientation::Row), Just(Orientation::Column)]
}

fn any_sample(fmt: SampleFormat) -> impl Strategy<Value = NeighborhoodSample> {
    let (lo, hi) = fmt.range();
    (lo..=hi, lo..=hi, lo..=hi, lo..=hi, lo..=hi)
        .prop_map(|(c, n, ne, nw, w)| NeighborhoodSample::new(c, n, ne, nw, w))
}

fn signed16() -> SampleFormat {
    SampleFormat::signed(16).unwrap()
}

// Property 1: the model is a pure function
proptest! {
    #[test]
    fn prop_model_is_pure(
        flags in any_flags(),
        sample in any_sample(signed16()),
        orientation in any_orientation()
    ) {
        let a = local_diff(flags, sample, orientation);
        let b = local_diff(flags, sample, orientation);
        prop_assert_eq!(a, b);
    }
}

// Property 2: the image's first pixel reports zero local sum and d_c
proptest! {
    #[test]
    fn prop_image_start_is_zero(
        last_in_line in any::<bool>(),
        sample in any_sample(signed16()),
        orientation in any_orientation()
    ) {
        let flags = ControlFlags::new(true, true, last_in_line);
        let out = local_diff(flags, sample, orientation);
        prop_assert_eq!(out.d_c, 0);
        prop_assert_eq!(out.local_sum, 0);
    }
}

// Property 3: nothing above the first line exists, so the directional differences vanish
proptest! {
    #[test]
    fn prop_first_line_has_no_directional_differences(
        first_in_line in any::<bool>(),
        last_in_line in any::<bool>(),
        sample in any_sample(signed16()),
        orientation in any_orientation()
    ) {
        let flags = ControlFlags::new(true, first_in_line, last_in_line);
        let out = local_diff(flags, sample, orientation);
        prop_assert_eq!((out.d_n, out.d_w, out.d_nw), (0, 0, 0));
    }
}

// Property 4: first pixel in a line reflects north into W and NW
proptest! {
    #[test]
    fn prop_first_in_line_reflects_north(
        last_in_line in any::<bool>(),
        sample in any_sample(signed16()),
        orientation in any_orientation()
    ) {
        let flags = ControlFlags::new(false, true, last_in_line);
        let out = local_diff(flags, sample, orientation);
        let reflected = 4 * i128::from(sample.north) - out.local_sum;
        prop_assert_eq!(out.d_w, reflected);
        prop_assert_eq!(out.d_nw, reflected);
        prop_assert_eq!(out.d_n, reflected);
    }
}

// Property 5: column orientation only looks at N (or W on the first line)
proptest! {
    #[test]
    fn prop_column_sum_ignores_diagonals(
        flags in any_flags(),
        sample in any_sample(SampleFormat::unsigned(12).unwrap()),
        ne in 0i64..4096,
        nw in 0i64..4096
    ) {
        prop_assume!(!flags.is_image_start());
        let moved = NeighborhoodSample { north_east: ne, north_west: nw, ..sample };
        let a = local_diff(flags, sample, Orientation::Column);
        let b = local_diff(flags, moved, Orientation::Column);
        prop_assert_eq!(a.local_sum, b.local_sum);
        prop_assert_eq!(a.d_c, b.d_c);
    }
}

#[test]
fn test_scenario_column_first_line_unsigned() {
    let fmt = SampleFormat::unsigned(8).unwrap();
    let sample = NeighborhoodSample::new(0, 0, 0, 0, 7);
    assert!(fmt.contains(sample.west));
    let out = local_diff(ControlFlags::new(true, false, false), sample, Orientation::Column);
    assert_eq!(out.local_sum, 28);
}

#[test]
fn test_scenario_row_interior_signed() {
    let fmt = SampleFormat::signed(8).unwrap();
    let sample = NeighborhoodSample::new(10, 5, 6, 4, 3);
    assert!([sample.cur, sample.north, sample.north_east, sample.north_west, sample.west]
        .iter()
        .all(|&v| fmt.contains(v)));
    let out = local_diff(ControlFlags::interior(), sample, Orientation::Row);
    assert_eq!(out.local_sum, 18);
    assert_eq!(out.d_c, 22);
    assert_eq!(out.d_n, 2);
    assert_eq!(out.d_nw, -2);
    assert_eq!(out.d_w, -6);
}
