//! Play-by-play text from detected events.
use crate::constants::LEAD_CHANGE_COMMENTARY_GAP;
use crate::random::RandomSource;

const START_LINES: &[&str] = &[
    "And they're off in the {race} at {track}!",
    "The gates open and the {race} is underway at {track}!",
    "A clean break from the gate in the {race}!",
];

const LEAD_CHANGE_LINES: &[&str] = &[
    "{horse} takes the lead from {other}!",
    "{horse} surges past {other} to grab the front!",
    "Change at the top: {horse} now leads, {other} gives way.",
];

const FINAL_STRETCH_LINES: &[&str] = &[
    "Into the final stretch, {horse} in front!",
    "Turning for home and it's {horse} leading the way!",
    "Here comes the stretch run, {horse} still on top!",
];

const PHOTO_FINISH_LINES: &[&str] = &[
    "It's too close to call between {horse} and {other}! We'll need a photo!",
    "{horse} and {other} hit the wire together! Photo finish!",
    "Neck and neck at the line, {horse} and {other}! It goes to the photo!",
];

const WINNER_LINES: &[&str] = &[
    "{horse} wins the {race}!",
    "{horse} crosses the line first to take the {race}!",
    "Victory for {horse} in the {race}!",
];

const PLACING_LINES: &[&str] = &[
    "{horse} finishes {place}.",
    "{place} goes to {horse}.",
    "{horse} comes home {place}.",
];

fn ordinal(place: usize) -> String {
    let suffix = match (place % 10, place % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{place}{suffix}")
}

fn pick<R: RandomSource + ?Sized>(pool: &'static [&'static str], rng: &mut R) -> &'static str {
    let len = u32::try_from(pool.len()).unwrap_or(u32::MAX);
    let index = usize::try_from(rng.next_below(len)).unwrap_or(0);
    pool.get(index).copied().unwrap_or_default()
}

/// Names substituted into a template.
#[derive(Debug, Clone, Copy, Default)]
struct Fill<'a> {
    horse: &'a str,
    other: &'a str,
    race: &'a str,
    track: &'a str,
}

impl Fill<'_> {
    fn value(&self, key: &str) -> Option<&str> {
        match key {
            "horse" => Some(self.horse),
            "other" => Some(self.other),
            "race" => Some(self.race),
            "track" => Some(self.track),
            _ => None,
        }
    }

    /// Single left-to-right pass; substituted names are never rescanned.
    fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len() + 32);
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let filled = tail
                .find('}')
                .and_then(|close| Some((close, self.value(&tail[1..close])?)));
            if let Some((close, value)) = filled {
                out.push_str(value);
                rest = &tail[close + 1..];
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

/// Stateful line generator for a single run.
///
/// Keeps the lead-change throttle and guarantees at most one photo-finish call.
#[derive(Debug, Clone)]
pub struct CommentaryGenerator {
    race_name: String,
    track_name: String,
    lead_change_gap: u32,
    last_lead_call: Option<u32>,
    photo_called: bool,
}

impl CommentaryGenerator {
    #[must_use]
    pub fn new(race_name: impl Into<String>, track_name: impl Into<String>) -> Self {
        Self {
            race_name: race_name.into(),
            track_name: track_name.into(),
            lead_change_gap: LEAD_CHANGE_COMMENTARY_GAP,
            last_lead_call: None,
            photo_called: false,
        }
    }

    #[must_use]
    pub const fn with_lead_change_gap(mut self, gap: u32) -> Self {
        self.lead_change_gap = gap;
        self
    }

    #[must_use]
    pub const fn photo_called(&self) -> bool {
        self.photo_called
    }

    fn fill<'a>(&'a self, horse: &'a str, other: &'a str) -> Fill<'a> {
        let track = if self.track_name.is_empty() {
            "the track"
        } else {
            &self.track_name
        };
        Fill {
            horse,
            other,
            race: &self.race_name,
            track,
        }
    }

    pub fn start_line<R: RandomSource + ?Sized>(&self, rng: &mut R) -> String {
        let template = pick(START_LINES, rng);
        self.fill("", "").render(template)
    }

    /// `None` when a lead change was already called within the throttle window.
    pub fn lead_change_line<R: RandomSource + ?Sized>(
        &mut self,
        tick: u32,
        leader: &str,
        previous: &str,
        rng: &mut R,
    ) -> Option<String> {
        if let Some(last) = self.last_lead_call
            && tick.saturating_sub(last) < self.lead_change_gap
        {
            return None;
        }
        self.last_lead_call = Some(tick);
        let template = pick(LEAD_CHANGE_LINES, rng);
        Some(self.fill(leader, previous).render(template))
    }

    pub fn final_stretch_line<R: RandomSource + ?Sized>(
        &self,
        leader: &str,
        rng: &mut R,
    ) -> String {
        let template = pick(FINAL_STRETCH_LINES, rng);
        self.fill(leader, "").render(template)
    }

    /// Closing lines in finish order. A photo-finish call, when given, comes
    /// first and is emitted at most once per race.
    pub fn finish_lines<R: RandomSource + ?Sized>(
        &mut self,
        standings: &[&str],
        photo: Option<(&str, &str)>,
        rng: &mut R,
    ) -> Vec<String> {
        let mut lines = Vec::with_capacity(standings.len() + 1);
        if let Some((winner, runner_up)) = photo
            && standings.len() > 1
            && !self.photo_called
        {
            self.photo_called = true;
            let template = pick(PHOTO_FINISH_LINES, rng);
            lines.push(self.fill(winner, runner_up).render(template));
        }
        let mut order = standings.iter().enumerate();
        if let Some((_, winner)) = order.next() {
            let template = pick(WINNER_LINES, rng);
            lines.push(self.fill(winner, "").render(template));
        }
        for (index, name) in order {
            let template = pick(PLACING_LINES, rng);
            let line = self
                .fill(name, "")
                .render(template)
                .replace("{place}", &ordinal(index + 1));
            lines.push(capitalize(&line));
        }
        lines
    }
}

fn capitalize(line: &str) -> String {
    let mut chars = line.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{FixedRandom, ScriptedRandom};

    #[test]
    fn names_are_not_expanded_twice() {
        let fill = Fill {
            horse: "{track}",
            other: "Rival {race",
            race: "Derby",
            track: "Ascot",
        };
        assert_eq!(
            fill.render("{horse} edges {other} in the {race} at {track} {unknown}"),
            "{track} edges Rival {race in the Derby at Ascot {unknown}"
        );
        assert_eq!(fill.render("dangling {horse"), "dangling {horse");
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(21), "21st");
    }

    #[test]
    fn templates_pick_by_rng() {
        let generator = CommentaryGenerator::new("Derby", "Churchill");
        let mut first = ScriptedRandom::new(vec![0.0]);
        assert_eq!(
            generator.start_line(&mut first),
            "And they're off in the Derby at Churchill!"
        );
        let mut last = ScriptedRandom::new(vec![0.99]);
        assert_eq!(
            generator.start_line(&mut last),
            "A clean break from the gate in the Derby!"
        );
    }

    #[test]
    fn lead_changes_are_throttled() {
        let mut generator = CommentaryGenerator::new("Derby", "");
        let mut rng = FixedRandom::new(0.0);
        assert!(generator.lead_change_line(10, "A", "B", &mut rng).is_some());
        assert!(generator.lead_change_line(20, "B", "A", &mut rng).is_none());
        assert!(generator.lead_change_line(25, "B", "A", &mut rng).is_some());
        let mut unthrottled = CommentaryGenerator::new("Derby", "").with_lead_change_gap(0);
        assert!(unthrottled.lead_change_line(1, "A", "B", &mut rng).is_some());
        assert!(unthrottled.lead_change_line(1, "B", "A", &mut rng).is_some());
    }

    #[test]
    fn photo_line_precedes_placings_and_fires_once() {
        let mut generator = CommentaryGenerator::new("Oaks", "Epsom");
        let mut rng = FixedRandom::new(0.0);
        let lines = generator.finish_lines(
            &["Alpha", "Bravo", "Charlie"],
            Some(("Alpha", "Bravo")),
            &mut rng,
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("photo"));
        assert_eq!(lines[1], "Alpha wins the Oaks!");
        assert_eq!(lines[2], "Bravo finishes 2nd.");
        assert_eq!(lines[3], "Charlie finishes 3rd.");
        let again = generator.finish_lines(&["Alpha", "Bravo"], Some(("Alpha", "Bravo")), &mut rng);
        assert_eq!(again.len(), 2);
        assert!(generator.photo_called());
    }

    #[test]
    fn solo_race_never_calls_a_photo() {
        let mut generator = CommentaryGenerator::new("Solo", "");
        let mut rng = FixedRandom::midpoint();
        let lines = generator.finish_lines(&["Lonely"], Some(("Lonely", "Lonely")), &mut rng);
        assert_eq!(lines.len(), 1);
        assert!(!generator.photo_called());
    }

    #[test]
    fn placing_lines_are_capitalized() {
        let mut generator = CommentaryGenerator::new("Oaks", "");
        let mut rng = ScriptedRandom::new(vec![0.0, 0.5]);
        let lines = generator.finish_lines(&["Alpha", "Bravo"], None, &mut rng);
        assert_eq!(lines[1], "2nd goes to Bravo.");
    }
}
