//! rgbds symbol files (`BB:AAAA Label` per line).

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub bank: u8,
    pub addr: u16,
}

#[derive(Clone, Debug, Default)]
pub struct Symbols {
    by_name: std::collections::HashMap<String, Symbol>,
}

impl Symbols {
    pub fn parse(text: &str) -> Result<Self, crate::Error> {
        let mut by_name = std::collections::HashMap::new();
        for (i, line) in text.lines().enumerate() {
            let line = match line.find(';') {
                Some(pos) => &line[..pos],
                None => line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let invalid = || crate::Error::InvalidSymbolLine {
                line: i + 1,
                text: line.to_string(),
            };

            let (location, name) = line.split_once(char::is_whitespace).ok_or_else(invalid)?;
            let (bank, addr) = location.split_once(':').ok_or_else(invalid)?;
            let symbol = Symbol {
                bank: u8::from_str_radix(bank, 16).map_err(|_| invalid())?,
                addr: u16::from_str_radix(addr, 16).map_err(|_| invalid())?,
            };
            by_name.insert(name.trim().to_string(), symbol);
        }
        log::debug!("loaded {} symbols", by_name.len());
        Ok(Self { by_name })
    }

    pub fn load(path: &std::path::Path) -> Result<Self, crate::Error> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    pub fn get(&self, name: &str) -> Result<Symbol, crate::Error> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| crate::Error::MissingSymbol(name.to_string()))
    }

    pub fn insert(&mut self, name: &str, bank: u8, addr: u16) {
        self.by_name.insert(name.to_string(), Symbol { bank, addr });
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
