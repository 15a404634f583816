// src/matcher.rs
//
// Context tables and the nearest-match search.
//
// Each region owns an ordered pattern list. When two patterns occur at the
// same offset the earlier entry wins, so longer patterns come before their
// prefixes ("?>\n" before "?>", "<?=" before "<?" before "<").
//
// Search results are memoized per pattern for the current line: an occurrence
// found at or after the cursor stays the nearest one until the cursor passes
// it, and an absent pattern stays absent for the rest of the line.

use memchr::{memchr2, memmem};

use crate::error::{Construct, Region};

/// Action bound to a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hook {
    /// `<?`: flush, begin marker, enter host code.
    OpenCode,
    /// `?>`: end marker, back to markup.
    CloseCode,
    /// `<?=` / `<?%`: flush, wrap the tag body in a print call.
    OpenPrint(Construct),
    /// Buffer the matched text and switch region.
    Enter(Region),
    /// Buffer the matched text and return to markup.
    Leave,
    /// Emit the opener in the region's sink, then run a sub-scanner.
    Nested(Construct),
    StrayTagStart,
    StrayTagEnd,
}

#[derive(Debug)]
pub struct Pattern {
    pub text: &'static [u8],
    /// ASCII case-insensitive match.
    pub fold_case: bool,
    pub hook: Hook,
}

impl Pattern {
    const fn new(text: &'static [u8], hook: Hook) -> Self {
        Self { text, fold_case: false, hook }
    }

    const fn folded(text: &'static [u8], hook: Hook) -> Self {
        Self { text, fold_case: true, hook }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Offset of the first occurrence in `hay`.
    pub fn find_in(&self, hay: &[u8]) -> Option<usize> {
        if !self.fold_case {
            return memmem::find(hay, self.text);
        }
        let first = self.text[0];
        let n = self.text.len();
        let mut at = 0usize;
        while let Some(off) = memchr2(first.to_ascii_lowercase(), first.to_ascii_uppercase(), &hay[at..]) {
            let i = at + off;
            if i + n > hay.len() {
                return None;
            }
            if hay[i..i + n].eq_ignore_ascii_case(self.text) {
                return Some(i);
            }
            at = i + 1;
        }
        None
    }
}

/* ============================ Context tables ============================ */

static MARKUP: [Pattern; 12] = [
    Pattern::folded(b"<script", Hook::Enter(Region::Script)),
    Pattern::folded(b"<style", Hook::Enter(Region::Style)),
    Pattern::new(b"<!--", Hook::Nested(Construct::MarkupComment)),
    Pattern::new(b"<?\r\n", Hook::OpenCode),
    Pattern::new(b"<?\n", Hook::OpenCode),
    Pattern::new(b"<?=", Hook::OpenPrint(Construct::PrintArgs)),
    Pattern::new(b"<?%", Hook::OpenPrint(Construct::PrintfArgs)),
    Pattern::new(b"<?", Hook::OpenCode),
    Pattern::new(b"< ", Hook::StrayTagStart),
    Pattern::new(b"<\n", Hook::StrayTagStart),
    Pattern::new(b"<", Hook::Enter(Region::Tag)),
    Pattern::new(b">", Hook::StrayTagEnd),
];

static CODE: [Pattern; 8] = [
    Pattern::new(b"?>\r\n", Hook::CloseCode),
    Pattern::new(b"?>\n", Hook::CloseCode),
    Pattern::new(b"?>", Hook::CloseCode),
    Pattern::new(b"/*", Hook::Nested(Construct::BlockComment)),
    Pattern::new(b"//", Hook::Nested(Construct::LineComment)),
    Pattern::new(b"\"", Hook::Nested(Construct::DoubleQuoted)),
    Pattern::new(b"'", Hook::Nested(Construct::CharLiteral)),
    Pattern::new(b"#", Hook::Nested(Construct::Macro)),
];

static SCRIPT: [Pattern; 5] = [
    Pattern::folded(b"</script>", Hook::Leave),
    Pattern::new(b"/*", Hook::Nested(Construct::BlockComment)),
    Pattern::new(b"//", Hook::Nested(Construct::LineComment)),
    Pattern::new(b"\"", Hook::Nested(Construct::DoubleQuoted)),
    Pattern::new(b"'", Hook::Nested(Construct::SingleQuoted)),
];

static STYLE: [Pattern; 2] = [
    Pattern::folded(b"</style>", Hook::Leave),
    Pattern::new(b"/*", Hook::Nested(Construct::BlockComment)),
];

static TAG: [Pattern; 3] = [
    Pattern::new(b"\"", Hook::Nested(Construct::DoubleQuoted)),
    Pattern::new(b"'", Hook::Nested(Construct::SingleQuoted)),
    Pattern::new(b">", Hook::Leave),
];

impl Region {
    pub const ALL: [Region; 5] = [Region::Markup, Region::Code, Region::Script, Region::Style, Region::Tag];

    pub fn patterns(self) -> &'static [Pattern] {
        match self {
            Region::Markup => &MARKUP,
            Region::Code => &CODE,
            Region::Script => &SCRIPT,
            Region::Style => &STYLE,
            Region::Tag => &TAG,
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/* ============================== Match cache ============================= */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Unsearched,
    At(usize),
    Absent,
}

/// Nearest upcoming pattern occurrence.
#[derive(Clone, Copy, Debug)]
pub struct Match {
    pub pattern: &'static Pattern,
    pub at: usize,
}

/// Per-pattern search results for one line, keyed by the line generation.
#[derive(Debug)]
pub struct MatchCache {
    generation: u64,
    slots: [Vec<Slot>; 5],
    searches: usize,
}

impl Default for MatchCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchCache {
    pub fn new() -> Self {
        Self {
            generation: u64::MAX,
            slots: Region::ALL.map(|r| vec![Slot::Unsearched; r.patterns().len()]),
            searches: 0,
        }
    }

    fn sync(&mut self, generation: u64) {
        if self.generation != generation {
            for slots in &mut self.slots {
                slots.fill(Slot::Unsearched);
            }
            self.generation = generation;
        }
    }

    /// Find the pattern of `region` occurring nearest to `cursor` in `line`.
    pub fn next_match(&mut self, region: Region, line: &[u8], cursor: usize, generation: u64) -> Option<Match> {
        self.sync(generation);
        let patterns = region.patterns();
        let slots = &mut self.slots[region.index()];
        let mut best: Option<Match> = None;

        for (pattern, slot) in patterns.iter().zip(slots.iter_mut()) {
            let stale = match *slot {
                Slot::Unsearched => true,
                Slot::At(p) => p < cursor,
                Slot::Absent => false,
            };
            if stale {
                self.searches += 1;
                *slot = match pattern.find_in(&line[cursor..]) {
                    Some(off) => Slot::At(cursor + off),
                    None => Slot::Absent,
                };
            }
            if let Slot::At(p) = *slot {
                if best.map_or(true, |b| p < b.at) {
                    best = Some(Match { pattern, at: p });
                }
            }
        }
        best
    }

    /// Number of raw searches performed so far.
    pub fn searches(&self) -> usize {
        self.searches
    }
}
