/// Only break when a named emulator counter differs from a value, e.g. `TOTALCLKS!=$1a2b`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition {
    pub register: String,
    pub not_equal: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Breakpoint {
    pub label: String,
    pub condition: Option<Condition>,
}

impl Breakpoint {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            condition: None,
        }
    }

    pub fn unless_equal(mut self, register: &str, value: u64) -> Self {
        self.condition = Some(Condition {
            register: register.to_string(),
            not_equal: value,
        });
        self
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}!=${:x}", self.register, self.not_equal)
    }
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.condition {
            Some(condition) => write!(f, "{}/{}", self.label, condition),
            None => write!(f, "{}", self.label),
        }
    }
}

pub fn join(breakpoints: &[Breakpoint]) -> String {
    breakpoints.iter().map(|bp| bp.to_string()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Breakpoint::new("AI_Switch").to_string(), "AI_Switch");
        assert_eq!(
            Breakpoint::new("BattleMenu")
                .unless_equal("TOTALCLKS", 0x1a2b3c)
                .to_string(),
            "BattleMenu/TOTALCLKS!=$1a2b3c"
        );
    }

    #[test]
    fn test_join() {
        assert_eq!(
            join(&[
                Breakpoint::new("WinTrainerBattle").unless_equal("TOTALCLKS", 0xff),
                Breakpoint::new("LostBattle").unless_equal("TOTALCLKS", 0xff),
            ]),
            "WinTrainerBattle/TOTALCLKS!=$ff,LostBattle/TOTALCLKS!=$ff"
        );
        assert_eq!(join(&[]), "");
    }
}
