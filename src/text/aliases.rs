use std::collections::HashMap;

use super::INVISIBLE_CHARACTERS;

/// Built-in spellings of Premier League clubs (English, Russian, Ukrainian).
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("arsenal", "arsenal"),
    ("арсенал", "arsenal"),
    ("aston villa", "aston villa"),
    ("астон вилла", "aston villa"),
    ("астон вілла", "aston villa"),
    ("bournemouth", "bournemouth"),
    ("борнмут", "bournemouth"),
    ("brentford", "brentford"),
    ("брентфорд", "brentford"),
    ("brighton", "brighton"),
    ("brighton & hove albion", "brighton"),
    ("brighton hove", "brighton"),
    ("brighton hove albion", "brighton"),
    ("брайтон", "brighton"),
    ("брайтон енд хоу", "brighton"),
    ("burnley", "burnley"),
    ("бернли", "burnley"),
    ("бернлі", "burnley"),
    ("chelsea", "chelsea"),
    ("челси", "chelsea"),
    ("челсі", "chelsea"),
    ("crystal palace", "crystal palace"),
    ("кристал пэлас", "crystal palace"),
    ("кристал пелес", "crystal palace"),
    ("крістал пелес", "crystal palace"),
    ("everton", "everton"),
    ("эвертон", "everton"),
    ("евертон", "everton"),
    ("fulham", "fulham"),
    ("фулхэм", "fulham"),
    ("фулхем", "fulham"),
    ("фулгем", "fulham"),
    ("ipswich", "ipswich town"),
    ("ipswich town", "ipswich town"),
    ("ипсвич", "ipswich town"),
    ("іпсвіч", "ipswich town"),
    ("leeds", "leeds"),
    ("leeds united", "leeds"),
    ("лидс", "leeds"),
    ("лідс", "leeds"),
    ("leicester", "leicester"),
    ("leicester city", "leicester"),
    ("лестер", "leicester"),
    ("лейстер", "leicester"),
    ("liverpool", "liverpool"),
    ("ливерпуль", "liverpool"),
    ("ліверпуль", "liverpool"),
    ("luton", "luton town"),
    ("luton town", "luton town"),
    ("лутон", "luton town"),
    ("man city", "manchester city"),
    ("manchester city", "manchester city"),
    ("манчестер сити", "manchester city"),
    ("манчестер сіті", "manchester city"),
    ("man united", "manchester united"),
    ("man utd", "manchester united"),
    ("manchester united", "manchester united"),
    ("манчестер юнайтед", "manchester united"),
    ("newcastle", "newcastle united"),
    ("newcastle united", "newcastle united"),
    ("ньюкасл", "newcastle united"),
    ("ньюкасл юнайтед", "newcastle united"),
    ("nottingham", "nottingham forest"),
    ("nottingham forest", "nottingham forest"),
    ("ноттингем", "nottingham forest"),
    ("ноттінгем", "nottingham forest"),
    ("ноттінгем форест", "nottingham forest"),
    ("southampton", "southampton"),
    ("саутгемптон", "southampton"),
    ("sunderland", "sunderland"),
    ("сандерленд", "sunderland"),
    ("tottenham", "tottenham hotspur"),
    ("tottenham hotspur", "tottenham hotspur"),
    ("тоттенхэм", "tottenham hotspur"),
    ("тоттенхем", "tottenham hotspur"),
    ("тоттенгем", "tottenham hotspur"),
    ("west ham", "west ham united"),
    ("west ham united", "west ham united"),
    ("вест хэм", "west ham united"),
    ("вест хем", "west ham united"),
    ("wolverhampton", "wolverhampton wanderers"),
    ("wolverhampton wanderers", "wolverhampton wanderers"),
    ("wolves", "wolverhampton wanderers"),
    ("вулверхэмптон", "wolverhampton wanderers"),
    ("вулверхемптон", "wolverhampton wanderers"),
];

/// Resolves team spellings to one canonical lowercase name for identity keys.
#[derive(Debug, Clone)]
pub struct TeamNames {
    aliases: HashMap<String, String>,
}

impl Default for TeamNames {
    fn default() -> Self {
        Self::new(&HashMap::new())
    }
}

impl TeamNames {
    /// Built-in aliases plus user entries; user entries win on conflict.
    pub fn new(extra: &HashMap<String, String>) -> Self {
        let mut aliases: HashMap<String, String> = BUILTIN_ALIASES
            .iter()
            .map(|(alias, canonical)| (fold(alias), fold(canonical)))
            .collect();
        for (alias, canonical) in extra {
            aliases.insert(fold(alias), fold(canonical));
        }
        Self { aliases }
    }

    pub fn canonical(&self, name: &str) -> String {
        let folded = fold(name);
        match self.aliases.get(&folded) {
            Some(canonical) => canonical.clone(),
            None => folded,
        }
    }

    pub fn same_team(&self, a: &str, b: &str) -> bool {
        self.canonical(a) == self.canonical(b)
    }
}

/// Case, spacing and spelling fold applied before alias lookup.
fn fold(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !INVISIBLE_CHARACTERS.contains(c))
        .map(|c| match c {
            '\u{a0}' | '-' | '–' | '—' => ' ',
            'ё' => 'е',
            'Ё' => 'Е',
            other => other,
        })
        .collect();
    cleaned
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
