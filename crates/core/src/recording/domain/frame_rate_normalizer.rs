use std::num::NonZeroUsize;

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot normalize a recording with no captured frames")]
pub struct EmptyCaptureError;

/// Maps output positions onto captured frame indices.
///
/// Position `i` of `target_frame_count` picks
/// `min(floor(i / target_frame_count * captured_count), captured_count - 1)`,
/// computed in integer arithmetic so the floor is exact. The sequence is
/// non-decreasing, starts at 0 and never exceeds `captured_count - 1`.
/// Short captures repeat frames; long captures skip frames. There is no
/// interpolation.
pub fn source_indices(
    captured_count: usize,
    target_frame_count: NonZeroUsize,
) -> Result<Vec<usize>, EmptyCaptureError> {
    if captured_count == 0 {
        return Err(EmptyCaptureError);
    }

    let target = target_frame_count.get() as u128;
    let captured = captured_count as u128;
    let last = captured_count - 1;

    Ok((0..target_frame_count.get())
        .map(|i| {
            let proportional = (i as u128 * captured / target) as usize;
            proportional.min(last)
        })
        .collect())
}

/// Re-times a captured sequence onto a fixed-length output timeline.
///
/// Returns exactly `target_frame_count` references into `captured`, in
/// non-decreasing source order. Frames are never copied or modified.
pub fn normalize<T>(
    captured: &[T],
    target_frame_count: NonZeroUsize,
) -> Result<Vec<&T>, EmptyCaptureError> {
    let indices = source_indices(captured.len(), target_frame_count)?;
    Ok(indices.into_iter().map(|i| &captured[i]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_stretches_short_capture() {
        // 95 frames captured for a 30 fps x 10 s target
        let captured: Vec<usize> = (0..95).collect();
        let out = normalize(&captured, nz(300)).unwrap();
        assert_eq!(out.len(), 300);
        assert_eq!(*out[0], 0);
        assert_eq!(*out[299], 94);
    }

    #[test]
    fn test_downsamples_long_capture() {
        let captured: Vec<usize> = (0..500).collect();
        let out = normalize(&captured, nz(300)).unwrap();
        assert_eq!(out.len(), 300);
        assert_eq!(*out[0], 0);
        assert_eq!(*out[299], 498);
    }

    #[test]
    fn test_single_frame_fills_output() {
        let captured = vec!["only"];
        let out = normalize(&captured, nz(10)).unwrap();
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|f| std::ptr::eq(*f, &captured[0])));
    }

    #[test]
    fn test_empty_capture_is_an_error() {
        let captured: Vec<u8> = Vec::new();
        assert_eq!(normalize(&captured, nz(300)), Err(EmptyCaptureError));
        assert_eq!(source_indices(0, nz(1)), Err(EmptyCaptureError));
    }

    #[test]
    fn test_equal_counts_is_identity() {
        let indices = source_indices(300, nz(300)).unwrap();
        assert!(indices.iter().enumerate().all(|(i, &src)| i == src));
    }

    #[test]
    fn test_returns_references_not_copies() {
        let captured = vec![String::from("a"), String::from("b")];
        let out = normalize(&captured, nz(4)).unwrap();
        assert!(std::ptr::eq(out[0], &captured[0]));
        assert!(std::ptr::eq(out[3], &captured[1]));
    }

    #[test]
    fn test_repeated_calls_agree() {
        let first = source_indices(137, nz(300)).unwrap();
        let second = source_indices(137, nz(300)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_large_counts_do_not_overflow() {
        let indices = source_indices(usize::MAX / 2, nz(3)).unwrap();
        assert_eq!(indices.len(), 3);
        assert_eq!(indices[0], 0);
        assert!(indices[2] < usize::MAX / 2);
    }

    #[rstest]
    #[case(1, 1)]
    #[case(1, 300)]
    #[case(7, 3)]
    #[case(95, 300)]
    #[case(299, 300)]
    #[case(301, 300)]
    #[case(500, 300)]
    #[case(1000, 50)]
    #[case(3, 1000)]
    fn test_mapping_properties(#[case] captured: usize, #[case] target: usize) {
        let indices = source_indices(captured, nz(target)).unwrap();

        assert_eq!(indices.len(), target);
        assert_eq!(indices[0], 0);
        assert!(indices.windows(2).all(|w| w[0] <= w[1]));
        assert!(indices.iter().all(|&i| i <= captured - 1));
    }

    #[rstest]
    #[case(10, 30, &[0, 0, 0, 1, 1, 1])]
    #[case(6, 3, &[0, 2, 4])]
    #[case(4, 8, &[0, 0, 1, 1, 2, 2, 3, 3])]
    fn test_mapping_prefix(
        #[case] captured: usize,
        #[case] target: usize,
        #[case] expected_prefix: &[usize],
    ) {
        let indices = source_indices(captured, nz(target)).unwrap();
        assert_eq!(&indices[..expected_prefix.len()], expected_prefix);
    }
}
