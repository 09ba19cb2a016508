use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::model::ContentHash;

const READ_CHUNK: usize = 8 * 1024;

/// Hashes a file's full byte content with SHA-1.
///
/// The digest matches the key the media server derives for uploaded
/// posters, so it is used to spot artwork that was already uploaded. It is
/// not an integrity check.
pub fn fingerprint(path: &Path) -> io::Result<ContentHash> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha1::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        hasher.update(&chunk[..read]);
    }

    Ok(ContentHash::from_digest(&hasher.finalize()))
}
