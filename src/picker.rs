//! Language picker: the list of languages a user can switch to, with names
//! and one-click activation links.

use crate::i18n::{AvailableLanguagesProvider, LanguageNameCatalog, NamePart};
use crate::locale::LocaleCode;
use serde::Serialize;
use std::sync::Arc;

/// One selectable language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerEntry {
    pub code: LocaleCode,
    pub native_name: String,
    pub international_name: String,
    /// Current request URL with the override parameter set to `code`
    pub activation_link: String,
    /// Hover text, e.g. "German (de_DE)"
    pub tooltip: String,
    /// Stable identifier for the menu node of this entry
    pub menu_id: String,
}

#[derive(Debug, Clone)]
pub struct LanguagePickerBuilder {
    catalog: Arc<LanguageNameCatalog>,
    languages: Arc<AvailableLanguagesProvider>,
    param: String,
}

impl LanguagePickerBuilder {
    pub fn new(
        catalog: Arc<LanguageNameCatalog>,
        languages: Arc<AvailableLanguagesProvider>,
        param: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            languages,
            param: param.into(),
        }
    }

    /// Picker over the provider's current language list.
    pub fn build(&self, current_locale: &LocaleCode, request_url: &str) -> LanguagePicker {
        self.build_from(current_locale, self.languages.available(), request_url)
    }

    /// Picker over an explicit, already baseline-extended language list.
    pub fn build_from(
        &self,
        current_locale: &LocaleCode,
        available: Vec<LocaleCode>,
        request_url: &str,
    ) -> LanguagePicker {
        LanguagePicker {
            catalog: Arc::clone(&self.catalog),
            param: self.param.clone(),
            current: current_locale.clone(),
            available,
            request_url: request_url.to_string(),
        }
    }
}

/// Picker entries for one request.
///
/// Entries are computed while iterating; every pass yields the same entries
/// in provider order, without the current locale.
#[derive(Debug, Clone)]
pub struct LanguagePicker {
    catalog: Arc<LanguageNameCatalog>,
    param: String,
    current: LocaleCode,
    available: Vec<LocaleCode>,
    request_url: String,
}

impl LanguagePicker {
    /// Native name of the active locale, used as the menu title.
    pub fn current_label(&self) -> String {
        self.catalog.lookup(self.current.as_str(), NamePart::Native)
    }

    pub fn iter(&self) -> PickerIter<'_> {
        PickerIter {
            picker: self,
            codes: self.available.iter(),
        }
    }

    pub fn entries(&self) -> Vec<PickerEntry> {
        self.iter().collect()
    }

    fn entry(&self, code: &LocaleCode) -> PickerEntry {
        let international_name = self.catalog.lookup(code.as_str(), NamePart::International);
        PickerEntry {
            code: code.clone(),
            native_name: self.catalog.lookup(code.as_str(), NamePart::Native),
            tooltip: format!("{} ({})", international_name, code),
            menu_id: format!("user-lang-pick-{}", code),
            international_name,
            activation_link: activation_link(&self.request_url, &self.param, code.as_str()),
        }
    }
}

impl<'p> IntoIterator for &'p LanguagePicker {
    type Item = PickerEntry;
    type IntoIter = PickerIter<'p>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct PickerIter<'p> {
    picker: &'p LanguagePicker,
    codes: std::slice::Iter<'p, LocaleCode>,
}

impl Iterator for PickerIter<'_> {
    type Item = PickerEntry;

    fn next(&mut self) -> Option<PickerEntry> {
        let code = self.codes.by_ref().find(|code| **code != self.picker.current)?;
        Some(self.picker.entry(code))
    }
}

/// `url` with `param` set to `value`.
///
/// Existing occurrences of `param` are dropped (names are compared after
/// percent-decoding) and the new pair is appended to the query; any fragment
/// is kept at the end.
pub fn activation_link(url: &str, param: &str, value: &str) -> String {
    let (without_fragment, fragment) = match url.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (url, None),
    };
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let mut link = String::with_capacity(url.len() + param.len() + value.len() + 2);
    link.push_str(path);
    link.push('?');

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let name = pair.split_once('=').map(|(name, _)| name).unwrap_or(pair);
        if percent_decode(name) != param {
            link.push_str(pair);
            link.push('&');
        }
    }

    link.push_str(&percent_encode(param));
    link.push('=');
    link.push_str(&percent_encode(value));

    if let Some(fragment) = fragment {
        link.push('#');
        link.push_str(fragment);
    }
    link
}

/// RFC 3986 encoding: everything except unreserved characters becomes `%XX`.
fn percent_encode(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Decode `%XX` escapes and `+`; malformed escapes are kept as written.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(high), Some(low)) => {
                        decoded.push(high << 4 | low);
                        i += 3;
                        continue;
                    }
                    _ => decoded.push(b'%'),
                }
            }
            b'+' => decoded.push(b' '),
            byte => decoded.push(byte),
        }
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|digit| digit as u8)
}
