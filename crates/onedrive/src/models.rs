//! Graph response types

use serde::Deserialize;

use cx_core::RemoteEntity;

/// A `{"value": [...]}` collection
#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drive {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub drive_type: Option<String>,
}

impl Drive {
    pub fn into_entity(self) -> RemoteEntity {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .or(self.drive_type)
            .unwrap_or_else(|| self.id.clone());
        RemoteEntity::drive(self.id, name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFacet {
    #[serde(default)]
    pub child_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// A file or folder in a drive
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub size: Option<u64>,

    #[serde(default)]
    pub folder: Option<FolderFacet>,

    #[serde(default)]
    pub file: Option<FileFacet>,

    #[serde(default)]
    pub last_modified_date_time: Option<jiff::Timestamp>,
}

impl DriveItem {
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }

    /// Only items with a `file` facet become files; packages and shortcuts
    /// have no downloadable content of their own
    pub fn into_entity(self) -> RemoteEntity {
        let modified = self.last_modified_date_time;
        let entity = if self.is_folder() {
            RemoteEntity::folder(self.id, self.name)
        } else if self.is_file() {
            RemoteEntity::file(self.id, self.name, self.size.unwrap_or(0))
        } else {
            RemoteEntity::item(self.id, self.name)
        };
        entity.with_last_modified(modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cx_core::EntityKind;

    #[test]
    fn test_drive_item_facets() {
        let json = r#"{"value":[
            {"id":"F1","name":"Documents","folder":{"childCount":3},"size":2048},
            {"id":"I1","name":"notes.txt","file":{"mimeType":"text/plain"},"size":12,
             "lastModifiedDateTime":"2024-05-01T10:00:00Z"}
        ]}"#;
        let items: Collection<DriveItem> = serde_json::from_str(json).unwrap();
        let entities: Vec<_> = items.value.into_iter().map(DriveItem::into_entity).collect();

        assert_eq!(entities[0].kind, EntityKind::Folder);
        assert!(entities[0].size_bytes.is_none());
        assert_eq!(entities[1].kind, EntityKind::File);
        assert_eq!(entities[1].size_bytes, Some(12));
        assert!(entities[1].last_modified.is_some());
    }

    #[test]
    fn test_items_without_file_facet_are_not_files() {
        let json = r#"{"value":[
            {"id":"N1","name":"Notebook","package":{"type":"oneNote"},"size":4096},
            {"id":"R1","name":"Shared","remoteItem":{"id":"X9"}},
            {"id":"I1","name":"a.csv","file":{}}
        ]}"#;
        let items: Collection<DriveItem> = serde_json::from_str(json).unwrap();
        let kinds: Vec<_> = items
            .value
            .into_iter()
            .map(|i| i.into_entity().kind)
            .collect();

        assert_eq!(kinds, vec![EntityKind::Item, EntityKind::Item, EntityKind::File]);
    }

    #[test]
    fn test_drive_name_fallback() {
        let drive: Drive = serde_json::from_str(r#"{"id":"b!x","driveType":"personal"}"#).unwrap();
        let entity = drive.into_entity();
        assert_eq!(entity.name, "personal");
        assert_eq!(entity.kind, EntityKind::Drive);
    }

    #[test]
    fn test_empty_collection() {
        let items: Collection<DriveItem> = serde_json::from_str("{}").unwrap();
        assert!(items.value.is_empty());
    }
}
