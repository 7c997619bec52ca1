//! Image collection: discover the browsing set under a root directory.
//!
//! The root's direct entries are scanned once, bounded by the collection
//! config. If nothing there is an image, subdirectories are walked up to
//! `max_depth` levels and the user picks one of the directories that turned
//! out to hold images.

use std::cmp::Ordering;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::classify::Classifier;
use crate::config::CollectionConfig;
use crate::nav::{ImageRef, NavState};

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("cannot read directory {}: {source}", .path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Strip Windows extended-length path prefix (`\\?\`) if present.
fn clean_path(p: &Path) -> PathBuf {
    let s = p.to_string_lossy();
    match s.strip_prefix(r"\\?\") {
        Some(rest) => PathBuf::from(rest),
        None => p.to_path_buf(),
    }
}

/// Places a browse session should not default to.
const SYSTEM_DIRS: &[&str] = &[
    "/bin",
    "/sbin",
    "/usr/bin",
    "/usr/sbin",
    "/usr/local/bin",
    "/Applications",
    r"C:\Windows",
    r"C:\Windows\System32",
];

/// True for a filesystem root, a system binary directory, or the directory
/// the running executable lives in.
pub fn looks_like_install_dir(dir: &Path) -> bool {
    if dir.parent().is_none() || SYSTEM_DIRS.iter().any(|d| dir == Path::new(d)) {
        return true;
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.canonicalize().ok())
        .and_then(|exe| exe.parent().map(clean_path))
        .is_some_and(|exe_dir| exe_dir == dir)
}

/// Outcome of the recursive walk for one directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirFinding {
    /// At least one image directly inside.
    HasImages,
    /// No direct images, but a retained descendant has some.
    DescendantHasImages,
    Empty,
}

/// A directory retained by the recursive walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub finding: DirFinding,
}

/// Picks one candidate directory. Returns a 0-based index; anything out of
/// range is treated as the first candidate.
pub trait Chooser {
    fn choose(&mut self, candidates: &[Candidate]) -> usize;
}

impl<F: FnMut(&[Candidate]) -> usize> Chooser for F {
    fn choose(&mut self, candidates: &[Candidate]) -> usize {
        self(candidates)
    }
}

/// Ordinal list on stdout, one line read from stdin.
pub struct StdinChooser;

impl Chooser for StdinChooser {
    fn choose(&mut self, candidates: &[Candidate]) -> usize {
        println!("No images here, but these directories have some:");
        for (i, c) in candidates.iter().enumerate() {
            let note = match c.finding {
                DirFinding::DescendantHasImages => " (in subdirectories)",
                _ => "",
            };
            println!("  {:>3}. {}{}", i + 1, c.path.display(), note);
        }
        print!("Choose a directory [1-{}] (default 1): ", candidates.len());
        io::stdout().flush().ok();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return 0;
        }
        parse_choice(&line, candidates.len())
    }
}

/// 1-based answer → 0-based index. Empty, garbage or out of range → 0.
pub fn parse_choice(input: &str, count: usize) -> usize {
    match input.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= count => n - 1,
        _ => 0,
    }
}

/// Counters for one collection run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Resolved root that was asked for.
    pub root: PathBuf,
    /// Directory the browsing set was taken from.
    pub source: PathBuf,
    /// Entries examined in the root.
    pub scanned: usize,
    /// Images seen in the source directory, including any past `max_images`.
    pub found: usize,
    /// Subdirectories of the root recorded as recursion candidates.
    pub dirs_considered: usize,
    /// The `max_files` cutoff was hit.
    pub truncated: bool,
    /// Directories offered to the chooser, if the recursive walk ran.
    pub candidates: Vec<Candidate>,
}

pub struct Collected {
    pub nav: NavState,
    pub report: ScanReport,
}

/// Direct contents of one directory, bounded by the config.
#[derive(Debug, Default)]
struct Listing {
    images: Vec<PathBuf>,
    subdirs: Vec<PathBuf>,
    seen_images: usize,
    scanned: usize,
    truncated: bool,
}

fn natural(a: &Path, b: &Path) -> Ordering {
    let name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    natord::compare(&name(a), &name(b))
}

pub struct Collector<C: Chooser> {
    cfg: CollectionConfig,
    classifier: Classifier,
    debug: bool,
    chooser: C,
}

impl<C: Chooser> Collector<C> {
    pub fn new(cfg: CollectionConfig, debug: bool, chooser: C) -> Self {
        Collector {
            cfg,
            classifier: Classifier::new(debug),
            debug,
            chooser,
        }
    }

    /// Build the browsing set for `root`, or the current directory if `None`.
    pub fn collect(&mut self, root: Option<&Path>) -> Result<Collected, CollectError> {
        let implicit = root.is_none();
        let requested = match root {
            Some(p) => p.to_path_buf(),
            None => std::env::current_dir().map_err(|source| CollectError::DirectoryUnreadable {
                path: PathBuf::from("."),
                source,
            })?,
        };
        let root = resolve(&requested)?;

        if implicit && looks_like_install_dir(&root) {
            log::warn!(
                "browsing {} (the current directory); pass a directory explicitly, e.g. `upv ~/Pictures`",
                root.display()
            );
        }

        let depth = self.cfg.max_depth;
        self.collect_resolved(root, depth)
    }

    /// `depth` is how many levels below `root` the walk may still go.
    fn collect_resolved(&mut self, root: PathBuf, depth: usize) -> Result<Collected, CollectError> {
        let listing = self.list_dir(&root)?;
        let mut report = ScanReport {
            root: root.clone(),
            source: root.clone(),
            scanned: listing.scanned,
            found: listing.seen_images,
            dirs_considered: listing.subdirs.len(),
            truncated: listing.truncated,
            candidates: Vec::new(),
        };

        if !listing.images.is_empty() {
            log::info!(
                "{}: scanned {} entries, {} images, {} directories",
                root.display(),
                report.scanned,
                report.found,
                report.dirs_considered
            );
            self.hint(report.found);
            return Ok(Collected {
                nav: into_nav(listing.images),
                report,
            });
        }

        let mut candidates = Vec::new();
        for sub in &listing.subdirs {
            self.walk(sub, depth, &mut candidates);
        }
        if candidates.is_empty() {
            log::info!(
                "{}: scanned {} entries, no images found (searched {} directories, depth {})",
                root.display(),
                report.scanned,
                report.dirs_considered,
                depth
            );
            return Ok(Collected {
                nav: NavState::new(),
                report,
            });
        }

        let pick = self.chooser.choose(&candidates);
        let chosen = candidates
            .get(pick)
            .unwrap_or(&candidates[0])
            .clone();
        report.candidates = candidates;
        log::info!("using {}", chosen.path.display());

        let sub = match self.list_dir(&chosen.path) {
            Ok(l) => l,
            Err(e) => {
                log::warn!("{}", e);
                report.source = chosen.path;
                return Ok(Collected {
                    nav: NavState::new(),
                    report,
                });
            }
        };

        if sub.images.is_empty() && chosen.finding == DirFinding::DescendantHasImages {
            // Images only further down: repeat the selection one level deeper,
            // within what is left of the depth budget.
            let level = chosen
                .path
                .strip_prefix(&root)
                .map(|rel| rel.components().count())
                .unwrap_or(1);
            let mut inner = self.collect_resolved(chosen.path, depth.saturating_sub(level))?;
            inner.report.root = report.root;
            inner.report.candidates = report.candidates;
            return Ok(inner);
        }

        report.source = chosen.path;
        report.found = sub.seen_images;
        log::info!(
            "{}: {} images",
            report.source.display(),
            report.found
        );
        self.hint(report.found);
        Ok(Collected {
            nav: into_nav(sub.images),
            report,
        })
    }

    /// Post-order walk: children first, then this directory's own images.
    /// Retained directories are pushed onto `out`.
    fn walk(&self, dir: &Path, depth: usize, out: &mut Vec<Candidate>) -> DirFinding {
        if depth == 0 {
            return DirFinding::Empty;
        }
        let listing = match self.list_dir(dir) {
            Ok(l) => l,
            Err(e) => {
                log::warn!("skipping {}", e);
                return DirFinding::Empty;
            }
        };

        let mut descendant = false;
        for sub in &listing.subdirs {
            if self.walk(sub, depth - 1, out) != DirFinding::Empty {
                descendant = true;
            }
        }

        let finding = if listing.seen_images > 0 {
            DirFinding::HasImages
        } else if descendant {
            DirFinding::DescendantHasImages
        } else {
            DirFinding::Empty
        };
        if self.debug {
            log::debug!("walk: {} -> {:?}", dir.display(), finding);
        }
        if finding != DirFinding::Empty {
            out.push(Candidate {
                path: dir.to_path_buf(),
                finding,
            });
        }
        finding
    }

    /// One pass over the direct entries of `dir`.
    fn list_dir(&self, dir: &Path) -> Result<Listing, CollectError> {
        // WalkDir reports an unreadable root as an item; check up front so it
        // surfaces as an error rather than an empty listing.
        std::fs::read_dir(dir).map_err(|source| CollectError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;

        let cfg = &self.cfg;
        let mut listing = Listing::default();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter();

        for entry in walker {
            if listing.scanned >= cfg.max_files {
                listing.truncated = true;
                log::info!(
                    "{}: stopped after {} entries (max_files)",
                    dir.display(),
                    cfg.max_files
                );
                break;
            }
            listing.scanned += 1;
            if cfg.batch_size > 0 && listing.scanned % cfg.batch_size == 0 {
                log::debug!(
                    "{}: scanned {} entries, {} images",
                    dir.display(),
                    listing.scanned,
                    listing.seen_images
                );
            }

            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::debug!("skip: {}", e);
                    continue;
                }
            };
            let ft = entry.file_type();
            if ft.is_file() {
                let name = entry.file_name().to_string_lossy();
                if self.classifier.is_image(&name) {
                    listing.seen_images += 1;
                    if listing.images.len() < cfg.max_images {
                        listing.images.push(entry.path().to_path_buf());
                    }
                }
            } else if ft.is_dir() && listing.subdirs.len() < cfg.max_subdirs {
                listing.subdirs.push(entry.path().to_path_buf());
            }
        }

        listing.images.sort_by(|a, b| natural(a, b));
        listing.subdirs.sort_by(|a, b| natural(a, b));
        Ok(listing)
    }

    fn hint(&self, found: usize) {
        if found > self.cfg.suggestion_threshold {
            println!(
                "{} images: next/previous with → / ← (or n / p), upscale with u or 2 / 3 / 4",
                found
            );
        }
    }
}

fn resolve(path: &Path) -> Result<PathBuf, CollectError> {
    let abs = path
        .canonicalize()
        .map_err(|source| CollectError::DirectoryUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
    if !abs.is_dir() {
        return Err(CollectError::NotADirectory(abs));
    }
    Ok(clean_path(&abs))
}

fn into_nav(paths: Vec<PathBuf>) -> NavState {
    NavState::from_refs(paths.into_iter().map(ImageRef::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, names: &[&str]) {
        for n in names {
            fs::write(dir.join(n), b"img").unwrap();
        }
    }

    fn first(_: &[Candidate]) -> usize {
        0
    }

    fn collector(cfg: CollectionConfig) -> Collector<fn(&[Candidate]) -> usize> {
        Collector::new(cfg, false, first as fn(&[Candidate]) -> usize)
    }

    fn names(nav: &NavState) -> Vec<String> {
        nav.items().iter().map(|r| r.file_name()).collect()
    }

    #[test]
    fn flat_dir_of_three_pngs() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["a.png", "b.png", "c.png"]);

        let out = collector(CollectionConfig::default())
            .collect(Some(dir.path()))
            .unwrap();
        assert_eq!(out.nav.len(), 3);
        assert_eq!(out.report.dirs_considered, 0);
        assert_eq!(out.report.found, 3);
        assert!(out.report.candidates.is_empty());
    }

    #[test]
    fn paths_are_absolute() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["a.jpg"]);
        let out = collector(CollectionConfig::default())
            .collect(Some(dir.path()))
            .unwrap();
        assert!(out.nav.current().unwrap().path().is_absolute());
    }

    #[test]
    fn non_images_skipped_and_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["page10.png", "page2.png", "page1.png", "notes.txt", "readme.md"],
        );
        let out = collector(CollectionConfig::default())
            .collect(Some(dir.path()))
            .unwrap();
        assert_eq!(names(&out.nav), vec!["page1.png", "page2.png", "page10.png"]);
        assert_eq!(out.report.scanned, 5);
    }

    #[test]
    fn empty_root_falls_back_to_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("chapter1");
        fs::create_dir(&sub).unwrap();
        touch(&sub, &["01.png", "02.png"]);

        let out = collector(CollectionConfig::default())
            .collect(Some(dir.path()))
            .unwrap();
        assert_eq!(out.nav.len(), 2);
        assert_eq!(out.report.source, sub.canonicalize().unwrap());
        assert_eq!(out.report.candidates.len(), 1);
        assert!(out
            .nav
            .items()
            .iter()
            .all(|r| r.path().parent() == Some(out.report.source.as_path())));
    }

    #[test]
    fn chooser_picks_second_candidate() {
        let dir = tempfile::tempdir().unwrap();
        for (d, files) in [("a", &["1.png"][..]), ("b", &["1.png", "2.png", "3.png"][..])] {
            let p = dir.path().join(d);
            fs::create_dir(&p).unwrap();
            touch(&p, files);
        }
        let mut c = Collector::new(CollectionConfig::default(), false, |c: &[Candidate]| -> usize {
            assert_eq!(c.len(), 2);
            1
        });
        let out = c.collect(Some(dir.path())).unwrap();
        assert_eq!(out.nav.len(), 3);
        assert!(out.report.source.ends_with("b"));
    }

    #[test]
    fn out_of_range_choice_uses_first() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("only");
        fs::create_dir(&sub).unwrap();
        touch(&sub, &["x.gif"]);
        let mut c = Collector::new(CollectionConfig::default(), false, |_: &[Candidate]| -> usize { 42 });
        let out = c.collect(Some(dir.path())).unwrap();
        assert_eq!(out.nav.len(), 1);
    }

    #[test]
    fn max_files_bounds_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<String> = (0..10).map(|i| format!("{}.png", i)).collect();
        let refs: Vec<&str> = files.iter().map(|s| s.as_str()).collect();
        touch(dir.path(), &refs);

        let cfg = CollectionConfig {
            max_files: 5,
            ..CollectionConfig::default()
        };
        let out = collector(cfg).collect(Some(dir.path())).unwrap();
        assert_eq!(out.report.scanned, 5);
        assert!(out.report.truncated);
        assert_eq!(out.nav.len(), 5);
        assert_eq!(out.nav.index(), 0);
        for r in out.nav.items() {
            assert!(r.path().exists());
        }
    }

    #[test]
    fn max_images_caps_but_keeps_counting() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["a.png", "b.png", "c.png", "d.png"]);
        let cfg = CollectionConfig {
            max_images: 2,
            ..CollectionConfig::default()
        };
        let out = collector(cfg).collect(Some(dir.path())).unwrap();
        assert_eq!(out.nav.len(), 2);
        assert_eq!(out.report.found, 4);
        assert!(!out.report.truncated);
    }

    #[test]
    fn nothing_anywhere_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        touch(&dir.path().join("docs"), &["notes.txt"]);
        touch(dir.path(), &["readme.txt"]);

        let mut c = Collector::new(CollectionConfig::default(), false, |_: &[Candidate]| -> usize {
            panic!("chooser must not be asked when there are no candidates")
        });
        let out = c.collect(Some(dir.path())).unwrap();
        assert!(out.nav.is_empty());
        assert_eq!(out.report.dirs_considered, 1);
    }

    #[test]
    fn depth_limit_hides_deep_images() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        touch(&deep, &["deep.png"]);

        let shallow = CollectionConfig {
            max_depth: 2,
            ..CollectionConfig::default()
        };
        assert!(collector(shallow).collect(Some(dir.path())).unwrap().nav.is_empty());

        let enough = CollectionConfig {
            max_depth: 3,
            ..CollectionConfig::default()
        };
        let out = collector(enough).collect(Some(dir.path())).unwrap();
        assert_eq!(out.nav.len(), 1);
        assert!(out.report.source.ends_with("a/b/c"));
    }

    #[test]
    fn walk_is_post_order_and_tags_findings() {
        let dir = tempfile::tempdir().unwrap();
        let outer = dir.path().join("outer");
        let inner = outer.join("inner");
        let empty = dir.path().join("empty");
        fs::create_dir_all(&inner).unwrap();
        fs::create_dir(&empty).unwrap();
        touch(&inner, &["p.png"]);

        let c = collector(CollectionConfig::default());
        let mut out = Vec::new();
        assert_eq!(c.walk(&outer, 3, &mut out), DirFinding::DescendantHasImages);
        assert_eq!(c.walk(&empty, 3, &mut out), DirFinding::Empty);
        assert_eq!(
            out,
            vec![
                Candidate {
                    path: inner.clone(),
                    finding: DirFinding::HasImages
                },
                Candidate {
                    path: outer.clone(),
                    finding: DirFinding::DescendantHasImages
                },
            ]
        );
        assert_eq!(c.walk(&outer, 0, &mut Vec::new()), DirFinding::Empty);
    }

    #[test]
    fn choosing_a_parent_descends_to_images() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("series").join("vol1");
        fs::create_dir_all(&inner).unwrap();
        touch(&inner, &["1.png", "2.png"]);

        // Candidates are post-order: [vol1, series]. Pick "series".
        let mut picks = Vec::new();
        let mut c = Collector::new(CollectionConfig::default(), false, |c: &[Candidate]| -> usize {
            picks.push(c.len());
            c.iter()
                .position(|x| x.finding == DirFinding::DescendantHasImages)
                .unwrap_or(0)
        });
        let out = c.collect(Some(dir.path())).unwrap();
        assert_eq!(out.nav.len(), 2);
        assert!(out.report.source.ends_with("vol1"));
        drop(c);
        assert_eq!(picks, vec![2, 1]);
    }

    #[test]
    fn walk_skips_directory_that_vanished() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");
        fs::create_dir(&gone).unwrap();
        touch(&gone, &["a.png"]);
        fs::remove_dir_all(&gone).unwrap();

        let c = collector(CollectionConfig::default());
        let mut out = Vec::new();
        assert_eq!(c.walk(&gone, 3, &mut out), DirFinding::Empty);
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn walk_skips_dangling_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        touch(&target, &["a.png"]);
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        fs::remove_dir_all(&target).unwrap();

        let mut c = collector(CollectionConfig::default());
        let mut out = Vec::new();
        assert_eq!(c.walk(&link, 3, &mut out), DirFinding::Empty);
        assert!(out.is_empty());

        // The same link seen from its parent is not offered as a candidate.
        let out = c.collect(Some(dir.path())).unwrap();
        assert!(out.nav.is_empty());
        assert!(out.report.candidates.is_empty());
    }

    #[test]
    fn descending_keeps_the_depth_budget() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        fs::create_dir_all(a.join("b")).unwrap();
        fs::create_dir_all(a.join("c").join("d")).unwrap();
        touch(&a.join("b"), &["1.png"]);
        // Three levels down: beyond max_depth=2 from the root.
        touch(&a.join("c").join("d"), &["2.png"]);

        let cfg = CollectionConfig {
            max_depth: 2,
            ..CollectionConfig::default()
        };
        let mut seen: Vec<Vec<PathBuf>> = Vec::new();
        let mut c = Collector::new(cfg, false, |c: &[Candidate]| -> usize {
            seen.push(c.iter().map(|x| x.path.clone()).collect());
            c.iter()
                .position(|x| x.finding == DirFinding::DescendantHasImages)
                .unwrap_or(0)
        });
        let out = c.collect(Some(dir.path())).unwrap();
        drop(c);

        assert_eq!(names(&out.nav), vec!["1.png"]);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].len(), 1);
        assert!(seen[1][0].ends_with("a/b"));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        let open = dir.path().join("open");
        fs::create_dir(&locked).unwrap();
        fs::create_dir(&open).unwrap();
        touch(&locked, &["hidden.png"]);
        touch(&open, &["seen.png"]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let out = collector(CollectionConfig::default())
            .collect(Some(dir.path()))
            .unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        // Root can read everything; otherwise only "open" is a candidate.
        assert!(!out.nav.is_empty());
        assert!(out.report.candidates.iter().any(|c| c.path.ends_with("open")));
    }

    #[test]
    fn missing_root_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = collector(CollectionConfig::default())
            .collect(Some(&dir.path().join("missing")))
            .err()
            .unwrap();
        assert!(matches!(err, CollectError::DirectoryUnreadable { .. }));
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["a.png"]);
        let err = collector(CollectionConfig::default())
            .collect(Some(&dir.path().join("a.png")))
            .err()
            .unwrap();
        assert!(matches!(err, CollectError::NotADirectory(_)));
    }

    #[test]
    fn parse_choice_defaults_to_first() {
        assert_eq!(parse_choice("2\n", 3), 1);
        assert_eq!(parse_choice(" 3 ", 3), 2);
        assert_eq!(parse_choice("", 3), 0);
        assert_eq!(parse_choice("0", 3), 0);
        assert_eq!(parse_choice("4", 3), 0);
        assert_eq!(parse_choice("two", 3), 0);
        assert_eq!(parse_choice("-1", 3), 0);
    }

    #[test]
    fn install_dir_detection() {
        assert!(looks_like_install_dir(Path::new("/")));
        assert!(looks_like_install_dir(Path::new("/usr/bin")));
        let dir = tempfile::tempdir().unwrap();
        assert!(!looks_like_install_dir(dir.path()));
    }

    #[test]
    fn clean_path_strips_win_prefix() {
        assert_eq!(clean_path(Path::new(r"\\?\C:\pics")), PathBuf::from(r"C:\pics"));
        assert_eq!(clean_path(Path::new("/home/u")), PathBuf::from("/home/u"));
    }
}
