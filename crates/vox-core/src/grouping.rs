//! Turn grouping.
//!
//! Consecutive utterances from the same speaker are drawn as one visual
//! block: the avatar is shown once and spacing is tighter. A speaker change
//! always starts a new block, and so does the first utterance of the
//! transcript. Latency measurements never take part in grouping.

use vox_types::{Event, Speaker};

/// Computes the first-in-sequence marker for each speaker in order.
pub fn first_in_sequence_markers<I>(speakers: I) -> Vec<bool>
where
    I: IntoIterator<Item = Speaker>,
{
    let mut previous: Option<Speaker> = None;
    speakers
        .into_iter()
        .map(|speaker| {
            let first = previous != Some(speaker);
            previous = Some(speaker);
            first
        })
        .collect()
}

/// The conversation-only projection of a display order.
///
/// Built in one pass. `positions` maps each display index to its position in
/// the projection, so marker lookups are O(1).
#[derive(Debug, Clone)]
pub struct ConversationSubsequence<'a> {
    /// (display index, event) for every conversation event, in order.
    events: Vec<(usize, &'a Event)>,
    markers: Vec<bool>,
    positions: Vec<Option<usize>>,
}

impl<'a> ConversationSubsequence<'a> {
    pub fn project(order: &'a [Event]) -> Self {
        let mut events = Vec::new();
        let mut positions = Vec::with_capacity(order.len());
        for (index, event) in order.iter().enumerate() {
            if event.is_conversation() {
                positions.push(Some(events.len()));
                events.push((index, event));
            } else {
                positions.push(None);
            }
        }

        let markers =
            first_in_sequence_markers(events.iter().filter_map(|(_, event)| event.speaker()));

        Self {
            events,
            markers,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Conversation events with their display index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a Event)> + '_ {
        self.events.iter().copied()
    }

    /// Position of the event at `display_index` within the projection.
    pub fn position_of(&self, display_index: usize) -> Option<usize> {
        self.positions.get(display_index).copied().flatten()
    }

    /// Whether the event at `display_index` starts a new turn group.
    ///
    /// # Panics
    ///
    /// Panics if `display_index` does not refer to a conversation event of
    /// the projected order. Every conversation event belongs to its own
    /// projection, so this only happens on a wiring bug.
    pub fn is_first_in_sequence(&self, display_index: usize) -> bool {
        let Some(position) = self.position_of(display_index) else {
            panic!(
                "event at display index {display_index} is not part of the conversation subsequence"
            );
        };
        self.markers[position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(order: &[Event]) -> Vec<bool> {
        let subsequence = ConversationSubsequence::project(order);
        subsequence
            .iter()
            .map(|(index, _)| subsequence.is_first_in_sequence(index))
            .collect()
    }

    #[test]
    fn test_first_event_always_starts_a_group() {
        assert_eq!(markers(&[Event::user("a")]), vec![true]);
        assert_eq!(markers(&[Event::agent("a")]), vec![true]);
    }

    #[test]
    fn test_same_speaker_merges_and_change_splits() {
        let order = [
            Event::user("1"),
            Event::user("2"),
            Event::agent("3"),
            Event::agent("4"),
            Event::agent("5"),
            Event::user("6"),
        ];
        assert_eq!(markers(&order), vec![true, false, true, false, false, true]);
    }

    #[test]
    fn test_empty_conversation_has_no_groups() {
        let subsequence = ConversationSubsequence::project(&[]);
        assert!(subsequence.is_empty());
        assert!(first_in_sequence_markers(Vec::new()).is_empty());
    }

    #[test]
    fn test_latency_events_do_not_affect_grouping() {
        let plain = [Event::user("a"), Event::user("b"), Event::agent("c")];
        let interleaved = [
            Event::latency(1.0, "ms", "x"),
            Event::user("a"),
            Event::latency(2.0, "ms", "x"),
            Event::user("b"),
            Event::latency(3.0, "ms", "x"),
            Event::latency(4.0, "ms", "x"),
            Event::agent("c"),
            Event::latency(5.0, "ms", "x"),
        ];
        assert_eq!(markers(&plain), markers(&interleaved));
    }

    #[test]
    fn test_generated_sequences_group_by_speaker_change() {
        for len in 0..=8 {
            for bits in 0u32..(1 << len) {
                let speakers: Vec<Speaker> = (0..len)
                    .map(|i| {
                        if bits & (1 << i) == 0 {
                            Speaker::User
                        } else {
                            Speaker::Agent
                        }
                    })
                    .collect();
                let expected: Vec<bool> = (0..len)
                    .map(|i| i == 0 || speakers[i] != speakers[i - 1])
                    .collect();
                assert_eq!(first_in_sequence_markers(speakers.clone()), expected);

                for pattern in 0..4 {
                    let mut order = Vec::new();
                    for (i, speaker) in speakers.iter().enumerate() {
                        if (i + pattern) % 3 == 0 {
                            order.push(Event::latency(i as f64, "ms", "x"));
                        }
                        order.push(match speaker {
                            Speaker::User => Event::user(i.to_string()),
                            Speaker::Agent => Event::agent(i.to_string()),
                        });
                    }
                    if pattern % 2 == 1 {
                        order.push(Event::latency(0.0, "ms", "x"));
                    }
                    assert_eq!(markers(&order), expected, "bits {bits:b}, pattern {pattern}");
                }
            }
        }
    }

    #[test]
    fn test_position_index() {
        let order = [
            Event::user("a"),
            Event::latency(1.0, "ms", "x"),
            Event::agent("b"),
        ];
        let subsequence = ConversationSubsequence::project(&order);
        assert_eq!(subsequence.len(), 2);
        assert_eq!(subsequence.position_of(0), Some(0));
        assert_eq!(subsequence.position_of(1), None);
        assert_eq!(subsequence.position_of(2), Some(1));
        assert_eq!(subsequence.position_of(3), None);
    }

    #[test]
    #[should_panic(expected = "not part of the conversation subsequence")]
    fn test_lookup_of_measurement_panics() {
        let order = [Event::user("a"), Event::latency(1.0, "ms", "x")];
        ConversationSubsequence::project(&order).is_first_in_sequence(1);
    }

    #[test]
    #[should_panic(expected = "not part of the conversation subsequence")]
    fn test_lookup_out_of_range_panics() {
        ConversationSubsequence::project(&[Event::user("a")]).is_first_in_sequence(5);
    }
}
