use std::fmt;

pub const MENU: &str = "\
1️⃣  Ingest all data
2️⃣  Query notes
3️⃣  Ask the thought agent
4️⃣  Reset the notes collection
5️⃣  Clear conversation memory
6️⃣  Run evaluations
7️⃣  Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Ingest,
    Query,
    Ask,
    Reset,
    ClearMemory,
    Evaluate,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown menu choice: {0:?}")]
pub struct InvalidChoice(pub String);

impl std::str::FromStr for MenuAction {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::Ingest),
            "2" => Ok(Self::Query),
            "3" => Ok(Self::Ask),
            "4" => Ok(Self::Reset),
            "5" => Ok(Self::ClearMemory),
            "6" => Ok(Self::Evaluate),
            "7" => Ok(Self::Exit),
            other => Err(InvalidChoice(other.to_string())),
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ingest => "ingest",
            Self::Query => "query",
            Self::Ask => "ask",
            Self::Reset => "reset",
            Self::ClearMemory => "clear-memory",
            Self::Evaluate => "evaluate",
            Self::Exit => "exit",
        };
        f.write_str(name)
    }
}

/// Only an explicit `yes` (any case) confirms a destructive action.
pub fn is_confirmed(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_choice() {
        let parsed: Vec<MenuAction> = (1..=7).map(|n| n.to_string().parse().unwrap()).collect();
        assert_eq!(
            parsed,
            vec![
                MenuAction::Ingest,
                MenuAction::Query,
                MenuAction::Ask,
                MenuAction::Reset,
                MenuAction::ClearMemory,
                MenuAction::Evaluate,
                MenuAction::Exit,
            ]
        );
        assert_eq!(" 7\n".parse::<MenuAction>(), Ok(MenuAction::Exit));
    }

    #[test]
    fn rejects_unknown_choices() {
        assert_eq!("8".parse::<MenuAction>(), Err(InvalidChoice("8".to_string())));
        assert!("".parse::<MenuAction>().is_err());
        assert!("exit".parse::<MenuAction>().is_err());
    }

    #[test]
    fn confirmation_requires_yes() {
        assert!(is_confirmed("yes"));
        assert!(is_confirmed(" YES \n"));
        assert!(!is_confirmed("y"));
        assert!(!is_confirmed(""));
    }
}
