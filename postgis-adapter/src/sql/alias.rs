/// Hands out the table aliases of one statement: `w1`, `w2`, ...
///
/// A generator lives for exactly one build, so aliases never leak between
/// statements and two subjects in the same statement never share one.
#[derive(Debug)]
pub struct AliasGenerator {
    next: u32,
}

impl Default for AliasGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AliasGenerator {
    pub fn new() -> Self {
        AliasGenerator { next: 1 }
    }

    pub fn next_alias(&mut self) -> String {
        let alias = format!("w{}", self.next);
        self.next += 1;
        alias
    }
}
