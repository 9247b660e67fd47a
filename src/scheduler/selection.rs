use crate::transcription::TranscriptSegment;

/// Start of the first segment at or after `min_time` whose text contains
/// `keyword` (case-insensitive). Keywords of `min_match_chars` characters or
/// fewer are not searched. Without a match the cursor jumps `fallback_jump`
/// seconds forward. The result is never earlier than `min_time`.
pub fn find_best_timestamp(
    segments: &[TranscriptSegment],
    keyword: Option<&str>,
    min_time: f64,
    min_match_chars: usize,
    fallback_jump: f64,
) -> f64 {
    if let Some(keyword) = keyword.filter(|k| k.chars().count() > min_match_chars) {
        let needle = keyword.to_lowercase();
        if let Some(segment) = segments
            .iter()
            .find(|seg| seg.start >= min_time && seg.text.to_lowercase().contains(&needle))
        {
            return segment.start;
        }
    }

    min_time + fallback_jump
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, 2.0, "intro"),
            TranscriptSegment::new(2.0, 5.0, "Photosynthesis happens here"),
            TranscriptSegment::new(5.0, 9.0, "outro"),
            TranscriptSegment::new(9.0, 12.0, "more photosynthesis later"),
        ]
    }

    #[test]
    fn test_first_match_wins() {
        let ts = find_best_timestamp(&segments(), Some("photosynthesis"), 0.0, 3, 4.0);
        assert_eq!(ts, 2.0);
    }

    #[test]
    fn test_match_respects_min_time() {
        let ts = find_best_timestamp(&segments(), Some("photosynthesis"), 2.5, 3, 4.0);
        assert_eq!(ts, 9.0);
    }

    #[test]
    fn test_segment_starting_exactly_at_min_time_matches() {
        let ts = find_best_timestamp(&segments(), Some("outro"), 5.0, 3, 4.0);
        assert_eq!(ts, 5.0);
    }

    #[test]
    fn test_fallback_on_miss() {
        let ts = find_best_timestamp(&segments(), Some("glucose"), 1.25, 3, 4.0);
        assert_eq!(ts, 1.25 + 4.0);
    }

    #[test]
    fn test_fallback_without_keyword() {
        assert_eq!(find_best_timestamp(&segments(), None, 7.0, 3, 4.0), 11.0);
    }

    #[test]
    fn test_short_keyword_not_searched() {
        // "here" appears in the transcript but is too short to search
        let ts = find_best_timestamp(&segments(), Some("here"), 0.0, 4, 4.0);
        assert_eq!(ts, 4.0);
    }

    #[test]
    fn test_empty_transcript_falls_back() {
        assert_eq!(find_best_timestamp(&[], Some("photosynthesis"), 3.0, 3, 4.0), 7.0);
    }

    #[test]
    fn test_never_before_min_time() {
        let segs = segments();
        for keyword in [None, Some("intro"), Some("photosynthesis"), Some("outro"), Some("absent")] {
            for step in 0..30 {
                let min_time = step as f64 * 0.5;
                assert!(find_best_timestamp(&segs, keyword, min_time, 3, 4.0) >= min_time);
            }
        }
    }
}
