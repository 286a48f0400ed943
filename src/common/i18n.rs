// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

// Traduções embutidas no binário. Chave ausente cai para o inglês e depois para a própria chave.
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn embedded() -> Result<Self, serde_json::Error> {
        let mut catalogs = HashMap::new();
        catalogs.insert("en".to_string(), serde_json::from_str(include_str!("../../locales/en.json"))?);
        catalogs.insert("pt".to_string(), serde_json::from_str(include_str!("../../locales/pt.json"))?);
        Ok(Self { catalogs })
    }

    pub fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|catalog| catalog.get(key)))
            .map(String::as_str)
    }

    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key).unwrap_or(key).to_string()
    }
}
