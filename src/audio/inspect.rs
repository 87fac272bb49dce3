//! Reads tags back from a finished file

use std::{fmt::Display, path::Path};

use lofty::{
    error::LoftyError,
    file::TaggedFileExt,
    prelude::Accessor,
    read_from_path,
    tag::{ItemKey, Tag},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSummary {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    /// embedded pictures across all tags of the file
    pub pictures: usize,
}

fn year(tag: &Tag) -> Option<String> {
    tag.get_string(&ItemKey::Year)
        .or_else(|| tag.get_string(&ItemKey::RecordingDate))
        .or_else(|| tag.get_string(&ItemKey::ReleaseDate))
        .map(str::to_string)
}

pub fn read_tags(path: &Path) -> Result<TagSummary, LoftyError> {
    let tagged = read_from_path(path)?;
    let pictures = tagged.tags().iter().map(|tag| tag.pictures().len()).sum();

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return Ok(TagSummary {
            pictures,
            ..Default::default()
        });
    };

    Ok(TagSummary {
        title: tag.title().map(|v| v.into_owned()),
        artist: tag.artist().map(|v| v.into_owned()),
        album: tag.album().map(|v| v.into_owned()),
        year: year(tag),
        genre: tag.genre().map(|v| v.into_owned()),
        pictures,
    })
}

impl Display for TagSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        writeln!(f, "title:    {}", show(&self.title))?;
        writeln!(f, "artist:   {}", show(&self.artist))?;
        writeln!(f, "album:    {}", show(&self.album))?;
        writeln!(f, "year:     {}", show(&self.year))?;
        writeln!(f, "genre:    {}", show(&self.genre))?;
        write!(f, "pictures: {}", self.pictures)
    }
}
