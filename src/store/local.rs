//! XML-file-backed rule store.
//!
//! The store file holds one `<rulestore>` root with a `<mailbox>` element per
//! mailbox, each containing `<folder>` and `<rule>` elements. All read/write
//! goes through quick_xml; saves replace the file atomically via a `.tmp`
//! sibling.

use crate::store::{RuleStore, StoreError};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Folder handle within the bound mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFolder {
    pub name: String,
}

/// A receive-time rule: move mail from `sender` into `folder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRule {
    pub sender: String,
    pub folder: String,
    pub enabled: bool,
}

#[derive(Debug, Default)]
struct Mailbox {
    name: String,
    folders: Vec<String>,
    rules: Vec<LocalRule>,
}

/// Rule store persisted in a local XML file, bound to one mailbox.
#[derive(Debug)]
pub struct LocalRuleStore {
    path: PathBuf,
    mailboxes: Vec<Mailbox>,
    active: usize,
}

fn unavailable<E: fmt::Display>(e: E) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn persistence<E: fmt::Display>(e: E) -> StoreError {
    StoreError::Persistence(e.to_string())
}

fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>, StoreError> {
    match e.try_get_attribute(name).map_err(unavailable)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(unavailable)?.into_owned())),
        None => Ok(None),
    }
}

fn parse_mailboxes(content: &str) -> Result<Vec<Mailbox>, StoreError> {
    let mut reader = Reader::from_str(content);
    let mut mailboxes: Vec<Mailbox> = Vec::new();
    loop {
        let event = match reader.read_event().map_err(unavailable)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => e,
            _ => continue,
        };
        match event.name().as_ref() {
            b"mailbox" => {
                let name = attribute(&event, "name")?.unwrap_or_default();
                mailboxes.push(Mailbox {
                    name,
                    ..Mailbox::default()
                });
            }
            b"folder" => {
                if let (Some(mailbox), Some(name)) =
                    (mailboxes.last_mut(), attribute(&event, "name")?)
                {
                    mailbox.folders.push(name);
                }
            }
            b"rule" => {
                let sender = attribute(&event, "sender")?;
                let folder = attribute(&event, "folder")?;
                let enabled = attribute(&event, "enabled")?.map_or(true, |v| v != "false");
                if let (Some(mailbox), Some(sender), Some(folder)) =
                    (mailboxes.last_mut(), sender, folder)
                {
                    mailbox.rules.push(LocalRule {
                        sender,
                        folder,
                        enabled,
                    });
                }
            }
            _ => {}
        }
    }
    Ok(mailboxes)
}

impl LocalRuleStore {
    /// Open the store file and bind to one mailbox.
    ///
    /// With `user` given, binds to the first mailbox whose display name
    /// contains the identifier (case-insensitive); without, to the first
    /// mailbox. A missing file starts an empty store with a single mailbox.
    /// An unreadable or corrupt file, or no matching mailbox, means no entry
    /// can be processed at all.
    pub fn open(path: &Path, user: Option<&str>) -> Result<Self, StoreError> {
        let mut mailboxes = match fs::read_to_string(path) {
            Ok(content) => parse_mailboxes(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(unavailable(e)),
        };
        if mailboxes.is_empty() {
            mailboxes.push(Mailbox {
                name: user.unwrap_or("local").to_string(),
                ..Mailbox::default()
            });
        }
        let active = match user {
            Some(user) => {
                let needle = user.to_lowercase();
                mailboxes
                    .iter()
                    .position(|m| m.name.to_lowercase().contains(&needle))
                    .ok_or_else(|| {
                        StoreError::Unavailable(format!(
                            "no mailbox matching {:?} in {}",
                            user,
                            path.display()
                        ))
                    })?
            }
            None => 0,
        };
        Ok(LocalRuleStore {
            path: path.to_path_buf(),
            mailboxes,
            active,
        })
    }

    /// Display name of the bound mailbox.
    pub fn mailbox_name(&self) -> &str {
        &self.mailboxes[self.active].name
    }

    fn mailbox(&self) -> &Mailbox {
        &self.mailboxes[self.active]
    }

    fn mailbox_mut(&mut self) -> &mut Mailbox {
        &mut self.mailboxes[self.active]
    }

    fn to_xml_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let mut out = Vec::new();
        let mut writer = Writer::new_with_indent(&mut out, b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(persistence)?;
        writer
            .write_event(Event::Start(BytesStart::new("rulestore")))
            .map_err(persistence)?;
        for mailbox in &self.mailboxes {
            let mut start = BytesStart::new("mailbox");
            start.push_attribute(("name", mailbox.name.as_str()));
            writer
                .write_event(Event::Start(start))
                .map_err(persistence)?;
            for folder in &mailbox.folders {
                let mut el = BytesStart::new("folder");
                el.push_attribute(("name", folder.as_str()));
                writer.write_event(Event::Empty(el)).map_err(persistence)?;
            }
            for rule in &mailbox.rules {
                let mut el = BytesStart::new("rule");
                el.push_attribute(("sender", rule.sender.as_str()));
                el.push_attribute(("folder", rule.folder.as_str()));
                el.push_attribute(("enabled", if rule.enabled { "true" } else { "false" }));
                writer.write_event(Event::Empty(el)).map_err(persistence)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("mailbox")))
                .map_err(persistence)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("rulestore")))
            .map_err(persistence)?;
        Ok(out)
    }
}

impl RuleStore for LocalRuleStore {
    type Folder = LocalFolder;
    type Rule = LocalRule;

    fn find_folder(&self, name: &str) -> Result<Option<LocalFolder>, StoreError> {
        Ok(self
            .mailbox()
            .folders
            .iter()
            .find(|folder| folder.as_str() == name)
            .map(|name| LocalFolder { name: name.clone() }))
    }

    fn create_folder(&mut self, name: &str) -> Result<LocalFolder, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::FolderCreation("folder name is blank".to_string()));
        }
        self.mailbox_mut().folders.push(name.to_string());
        Ok(LocalFolder {
            name: name.to_string(),
        })
    }

    fn list_rules(&self) -> Result<Vec<LocalRule>, StoreError> {
        Ok(self.mailbox().rules.clone())
    }

    fn rule_matches(&self, rule: &LocalRule, sender: &str, destination: &LocalFolder) -> bool {
        rule.enabled && rule.sender == sender && rule.folder == destination.name
    }

    fn create_rule(
        &mut self,
        sender: &str,
        destination: &LocalFolder,
    ) -> Result<LocalRule, StoreError> {
        if sender.trim().is_empty() {
            return Err(StoreError::RuleCreation("sender is blank".to_string()));
        }
        let rule = LocalRule {
            sender: sender.to_string(),
            folder: destination.name.clone(),
            enabled: true,
        };
        self.mailbox_mut().rules.push(rule.clone());
        Ok(rule)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let bytes = self.to_xml_bytes()?;
        // Write to a sibling and rename so a failed save never truncates
        // the existing store file.
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &bytes).map_err(persistence)?;
        fs::rename(&tmp_path, &self.path).map_err(persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO_MAILBOXES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
        <rulestore>\n\
          <mailbox name=\"Alice Personal\">\n\
            <folder name=\"Work\"/>\n\
            <rule sender=\"a@x.com\" folder=\"Work\" enabled=\"true\"/>\n\
            <rule sender=\"old@x.com\" folder=\"Work\" enabled=\"false\"/>\n\
          </mailbox>\n\
          <mailbox name=\"Bob\"/>\n\
        </rulestore>\n";

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("rules.xml")
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalRuleStore::open(&store_path(&dir), None).unwrap();
        assert_eq!(store.mailbox_name(), "local");
        assert_eq!(store.find_folder("Work").unwrap(), None);
        assert_eq!(store.list_rules().unwrap(), Vec::new());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        let mut store = LocalRuleStore::open(&path, None).unwrap();
        let folder = store.create_folder("Work").unwrap();
        store.create_rule("a@x.com", &folder).unwrap();
        store.persist().unwrap();

        let reopened = LocalRuleStore::open(&path, None).unwrap();
        let folder = reopened.find_folder("Work").unwrap().unwrap();
        let rules = reopened.list_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert!(reopened.rule_matches(&rules[0], "a@x.com", &folder));
        assert!(rules[0].enabled);
    }

    #[test]
    fn test_mailbox_resolution_by_display_name() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        fs::write(&path, TWO_MAILBOXES).unwrap();

        let store = LocalRuleStore::open(&path, Some("alice")).unwrap();
        assert_eq!(store.mailbox_name(), "Alice Personal");
        assert_eq!(store.list_rules().unwrap().len(), 2);

        let store = LocalRuleStore::open(&path, Some("Bob")).unwrap();
        assert_eq!(store.mailbox_name(), "Bob");
        assert_eq!(store.list_rules().unwrap(), Vec::new());

        let err = LocalRuleStore::open(&path, Some("carol")).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_disabled_rules_do_not_match() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        fs::write(&path, TWO_MAILBOXES).unwrap();

        let store = LocalRuleStore::open(&path, Some("alice")).unwrap();
        let folder = store.find_folder("Work").unwrap().unwrap();
        let rules = store.list_rules().unwrap();
        assert!(!store.rule_matches(&rules[1], "old@x.com", &folder));
    }

    #[test]
    fn test_persist_preserves_other_mailboxes() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        fs::write(&path, TWO_MAILBOXES).unwrap();

        let mut store = LocalRuleStore::open(&path, Some("alice")).unwrap();
        let folder = store.create_folder("Travel").unwrap();
        store.create_rule("air@x.com", &folder).unwrap();
        store.persist().unwrap();

        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("mailbox name=\"Bob\""));
        let bob = LocalRuleStore::open(&path, Some("bob")).unwrap();
        assert_eq!(bob.list_rules().unwrap(), Vec::new());
        let alice = LocalRuleStore::open(&path, Some("alice")).unwrap();
        assert!(alice.find_folder("Travel").unwrap().is_some());
    }

    #[test]
    fn test_blank_folder_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = LocalRuleStore::open(&store_path(&dir), None).unwrap();
        let err = store.create_folder("  ").unwrap_err();
        assert!(matches!(err, StoreError::FolderCreation(_)));
    }

    #[test]
    fn test_blank_sender_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = LocalRuleStore::open(&store_path(&dir), None).unwrap();
        let folder = store.create_folder("Work").unwrap();
        let err = store.create_rule("", &folder).unwrap_err();
        assert!(matches!(err, StoreError::RuleCreation(_)));
    }

    #[test]
    fn test_corrupt_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        fs::write(&path, "<rulestore><mailbox></rulestore>").unwrap();
        let err = LocalRuleStore::open(&path, None).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
