//! Line-oriented scene text format
//!
//! ```text
//! ; comment
//! [SCENE "level"]
//! [MODEL 0 "models/robot.iqm"]
//! [ANIMS 0 "models/robot.iqm"]
//! [NODE 0 "robot"]
//! position = 0 1 0
//! scale = 1 1 1
//! rotation = 1 0 0 0 1 0 0 0 1
//! tint = 255 255 255 255
//! model = 0
//! anims = 0
//! [NODE 1 "sword"]
//! [NodeAttachChildToBone 0 1 "hand"]
//! [NodeAttachChild 0 2]
//! [NodeInsertLOD 0 3 50]
//! [NodeDetachBranch 4]
//! ```
//!
//! Slot indices must be declared in order, starting at 0. Node keys hold
//! local-space components: the ones present are applied once every topology
//! section has run, so attaching does not disturb them. A node without a
//! `position` key keeps the one its bone attachment seeded. Nodes are created
//! under the scene root; `NodeDetachBranch` takes one out of the hierarchy.
//! Recoverable problems are logged as warnings and the line is skipped;
//! everything else aborts the load.

use std::fmt::{self, Write as _};

use thiserror::Error;

use super::container::Scene;
use crate::core::config::{ConfigError, SceneConfig};
use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat3, Transform, Vec3};
use crate::render::{AssetError, AssetLoader, Color};

/// Errors that abort a scene load
#[derive(Error, Debug)]
pub enum SceneFormatError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration the scene is built with is unusable
    #[error("Invalid scene configuration: {0}")]
    Config(#[from] ConfigError),

    /// The first section is not `[SCENE]`, or there is none
    #[error("line {line}: expecting a [SCENE] section first")]
    MissingScene {
        /// 1-based line number
        line: usize,
    },

    /// A second `[SCENE]` section
    #[error("line {line}: duplicate [SCENE] section")]
    DuplicateScene {
        /// 1-based line number
        line: usize,
    },

    /// A `[` without its closing `]` on the same line
    #[error("line {line}: expecting ']'")]
    UnterminatedSection {
        /// 1-based line number
        line: usize,
    },

    /// A section name this format does not define
    #[error("line {line}: unknown section [{name}]")]
    UnknownSection {
        /// 1-based line number
        line: usize,
        /// Section name as written
        name: String,
    },

    /// Wrong number or kind of section arguments
    #[error("line {line}: malformed [{section}] arguments")]
    BadArguments {
        /// 1-based line number
        line: usize,
        /// Section name
        section: &'static str,
    },

    /// A slot index other than the next free one
    #[error("line {line}: expected {kind} index {expected}, found {found}")]
    IndexOrder {
        /// 1-based line number
        line: usize,
        /// Slot kind
        kind: &'static str,
        /// Next free index
        expected: usize,
        /// Index in the file
        found: usize,
    },

    /// A topology section naming an undeclared node
    #[error("line {line}: unknown node index {index}")]
    UnknownNode {
        /// 1-based line number
        line: usize,
        /// Index in the file
        index: usize,
    },

    /// The scene refused a new slot
    #[error("line {line}: no free {kind} slot")]
    SlotsExhausted {
        /// 1-based line number
        line: usize,
        /// Slot kind
        kind: &'static str,
    },

    /// The asset loader failed
    #[error("line {line}: cannot load `{path}`: {source}")]
    Asset {
        /// 1-based line number
        line: usize,
        /// Asset path
        path: String,
        /// Loader error
        #[source]
        source: AssetError,
    },
}

/// Split a section header body into words, keeping quoted strings whole
///
/// Returns `None` on an unbalanced quote.
fn tokenize(text: &str) -> Option<Vec<&str>> {
    let mut tokens = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        if let Some(quoted) = rest.strip_prefix('"') {
            let end = quoted.find('"')?;
            tokens.push(&quoted[..end]);
            rest = &quoted[end + 1..];
        } else {
            let end = rest.find(|c: char| c.is_whitespace() || c == '"').unwrap_or(rest.len());
            tokens.push(&rest[..end]);
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }

    Some(tokens)
}

/// Byte offset of the `]` closing a section header, ignoring quoted text
fn header_end(text: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (offset, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ']' if !in_quotes => return Some(offset),
            _ => {}
        }
    }
    None
}

/// Parse whitespace or comma separated numbers, exactly `N` of them
fn parse_numbers<T: std::str::FromStr, const N: usize>(value: &str) -> Option<[T; N]> {
    let mut values = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|word| !word.is_empty())
        .map(str::parse::<T>);

    let mut out = Vec::with_capacity(N);
    for _ in 0..N {
        out.push(values.next()?.ok()?);
    }
    if values.next().is_some() {
        return None;
    }
    out.try_into().ok()
}

/// Transform keys read for one node slot
#[derive(Default)]
struct LocalKeys {
    position: Option<Vec3>,
    scale: Option<Vec3>,
    rotation: Option<Mat3>,
}

impl LocalKeys {
    fn apply(&self, local: &mut Transform) {
        if let Some(position) = self.position {
            local.position = position;
        }
        if let Some(scale) = self.scale {
            local.scale = scale;
        }
        if let Some(rotation) = self.rotation {
            local.rotation = rotation;
        }
    }
}

struct Loader<'a> {
    scene: Option<Scene>,
    config: SceneConfig,
    assets: &'a mut dyn AssetLoader,
    /// Transform keys of each node slot, applied at the end
    locals: Vec<LocalKeys>,
    /// Node slot receiving `key = value` lines
    current: Option<usize>,
}

impl Loader<'_> {
    fn scene(&mut self, line: usize) -> Result<&mut Scene, SceneFormatError> {
        self.scene.as_mut().ok_or(SceneFormatError::MissingScene { line })
    }

    fn node(&mut self, line: usize, index: usize) -> Result<NodeId, SceneFormatError> {
        self.scene(line)?
            .node_at(index)
            .ok_or(SceneFormatError::UnknownNode { line, index })
    }

    fn section(&mut self, line: usize, header: &str) -> Result<(), SceneFormatError> {
        let tokens = tokenize(header).ok_or(SceneFormatError::BadArguments {
            line,
            section: "section",
        })?;
        let Some((&name, args)) = tokens.split_first() else {
            return Err(SceneFormatError::UnknownSection {
                line,
                name: String::new(),
            });
        };

        self.current = None;

        if name != "SCENE" && self.scene.is_none() {
            return Err(SceneFormatError::MissingScene { line });
        }

        match name {
            "SCENE" => {
                if self.scene.is_some() {
                    return Err(SceneFormatError::DuplicateScene { line });
                }
                let [scene_name] = args else {
                    return Err(SceneFormatError::BadArguments { line, section: "SCENE" });
                };
                self.scene = Some(Scene::with_config(scene_name, self.config.clone())?);
            }
            "MODEL" => {
                let (index, path) = indexed_path(line, "MODEL", args)?;
                let scene = self.scene(line)?;
                check_order(line, "model", scene.models().len(), index)?;
                let model = self.assets.load_model(path).map_err(|source| SceneFormatError::Asset {
                    line,
                    path: path.to_string(),
                    source,
                })?;
                self.scene(line)?
                    .add_model(model, path)
                    .ok_or(SceneFormatError::SlotsExhausted { line, kind: "model" })?;
            }
            "ANIMS" => {
                let (index, path) = indexed_path(line, "ANIMS", args)?;
                let scene = self.scene(line)?;
                check_order(line, "animation", scene.animation_lists().len(), index)?;
                let animations =
                    self.assets
                        .load_animations(path)
                        .map_err(|source| SceneFormatError::Asset {
                            line,
                            path: path.to_string(),
                            source,
                        })?;
                self.scene(line)?
                    .add_animations(animations, path)
                    .ok_or(SceneFormatError::SlotsExhausted { line, kind: "animation" })?;
            }
            "NODE" => {
                let (index, node_name) = indexed_path(line, "NODE", args)?;
                let scene = self.scene(line)?;
                check_order(line, "node", scene.node_count(), index)?;
                scene
                    .add_node(node_name)
                    .ok_or(SceneFormatError::SlotsExhausted { line, kind: "node" })?;
                self.locals.push(LocalKeys::default());
                self.current = Some(index);
            }
            "NodeAttachChild" => {
                let [parent, child] = args else {
                    return Err(SceneFormatError::BadArguments { line, section: "NodeAttachChild" });
                };
                let parent = self.node(line, parse_index(line, "NodeAttachChild", parent)?)?;
                let child = self.node(line, parse_index(line, "NodeAttachChild", child)?)?;
                self.scene(line)?.tree_mut().attach_child(parent, child);
            }
            "NodeAttachChildToBone" => {
                let [parent, child, bone] = args else {
                    return Err(SceneFormatError::BadArguments {
                        line,
                        section: "NodeAttachChildToBone",
                    });
                };
                let parent = self.node(line, parse_index(line, "NodeAttachChildToBone", parent)?)?;
                let child = self.node(line, parse_index(line, "NodeAttachChildToBone", child)?)?;
                if !self.scene(line)?.tree_mut().attach_child_to_bone(parent, child, bone) {
                    log::warn!("line {line}: unknown bone `{bone}`");
                }
            }
            "NodeDetachBranch" => {
                let [node] = args else {
                    return Err(SceneFormatError::BadArguments { line, section: "NodeDetachBranch" });
                };
                let node = self.node(line, parse_index(line, "NodeDetachBranch", node)?)?;
                self.scene(line)?.tree_mut().detach_branch(node);
            }
            "NodeInsertLOD" => {
                let [node, lod, distance] = args else {
                    return Err(SceneFormatError::BadArguments { line, section: "NodeInsertLOD" });
                };
                let node = self.node(line, parse_index(line, "NodeInsertLOD", node)?)?;
                let lod = self.node(line, parse_index(line, "NodeInsertLOD", lod)?)?;
                let distance: f32 = distance.parse().map_err(|_| SceneFormatError::BadArguments {
                    line,
                    section: "NodeInsertLOD",
                })?;
                self.scene(line)?.insert_lod(node, lod, distance);
            }
            _ => {
                return Err(SceneFormatError::UnknownSection {
                    line,
                    name: name.to_string(),
                })
            }
        }

        Ok(())
    }

    fn key(&mut self, line: usize, key: &str, value: &str) {
        let Some(index) = self.current else {
            log::warn!("line {line}: key `{key}` outside of a NODE section, skipped");
            return;
        };
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let Some(id) = scene.node_at(index) else {
            return;
        };

        let malformed = || log::warn!("line {line}: malformed value for `{key}`, skipped");

        match key {
            "position" => match parse_numbers::<f32, 3>(value) {
                Some(v) => self.locals[index].position = Some(Vec3::from(v)),
                None => malformed(),
            },
            "scale" => match parse_numbers::<f32, 3>(value) {
                Some(v) => self.locals[index].scale = Some(Vec3::from(v)),
                None => malformed(),
            },
            "rotation" => match parse_numbers::<f32, 9>(value) {
                Some(m) => self.locals[index].rotation = Some(Mat3::from_row_slice(&m)),
                None => malformed(),
            },
            "tint" => match parse_numbers::<u8, 4>(value) {
                Some([r, g, b, a]) => {
                    if let Some(node) = scene.tree_mut().node_mut(id) {
                        node.tint = Color::new(r, g, b, a);
                    }
                }
                None => malformed(),
            },
            "model" => match value.trim().parse::<usize>() {
                Ok(slot) => match scene.model_at(slot) {
                    Some(model) => {
                        scene.tree_mut().set_model(id, Some(model));
                    }
                    None => log::warn!("line {line}: unknown model index {slot}, skipped"),
                },
                Err(_) => malformed(),
            },
            "anims" => match value.trim().parse::<usize>() {
                Ok(slot) => match scene.animations_at(slot) {
                    Some(animations) => scene.tree_mut().set_animations(id, Some(animations)),
                    None => log::warn!("line {line}: unknown anims index {slot}, skipped"),
                },
                Err(_) => malformed(),
            },
            _ => log::warn!("line {line}: unknown key `{key}`, skipped"),
        }
    }

    fn finish(self, last_line: usize) -> Result<Scene, SceneFormatError> {
        let mut scene = self.scene.ok_or(SceneFormatError::MissingScene { line: last_line })?;

        for (index, keys) in self.locals.iter().enumerate() {
            let Some(id) = scene.node_at(index) else {
                continue;
            };
            if let Some(node) = scene.tree_mut().node_mut(id) {
                keys.apply(&mut node.local);
            }
        }

        scene.update();
        Ok(scene)
    }
}

fn parse_index(line: usize, section: &'static str, word: &str) -> Result<usize, SceneFormatError> {
    word.parse()
        .map_err(|_| SceneFormatError::BadArguments { line, section })
}

fn indexed_path<'t>(
    line: usize,
    section: &'static str,
    args: &[&'t str],
) -> Result<(usize, &'t str), SceneFormatError> {
    match args {
        [index, text] => Ok((parse_index(line, section, index)?, *text)),
        _ => Err(SceneFormatError::BadArguments { line, section }),
    }
}

fn check_order(line: usize, kind: &'static str, expected: usize, found: usize) -> Result<(), SceneFormatError> {
    if expected == found {
        Ok(())
    } else {
        Err(SceneFormatError::IndexOrder {
            line,
            kind,
            expected,
            found,
        })
    }
}

impl Scene {
    /// Build a scene from its text form, with the default configuration
    pub fn load_str(text: &str, assets: &mut dyn AssetLoader) -> Result<Scene, SceneFormatError> {
        Self::load_str_with_config(text, SceneConfig::default(), assets)
    }

    /// Build a scene from its text form
    pub fn load_str_with_config(
        text: &str,
        config: SceneConfig,
        assets: &mut dyn AssetLoader,
    ) -> Result<Scene, SceneFormatError> {
        let mut loader = Loader {
            scene: None,
            config,
            assets,
            locals: Vec::new(),
            current: None,
        };

        let mut last_line = 1;
        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            last_line = line;
            let trimmed = raw.trim();

            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }

            let result = if let Some(header) = trimmed.strip_prefix('[') {
                match header_end(header) {
                    Some(end) => loader.section(line, &header[..end]),
                    None => Err(SceneFormatError::UnterminatedSection { line }),
                }
            } else if let Some((key, value)) = trimmed.split_once('=') {
                loader.key(line, key.trim(), value.trim());
                Ok(())
            } else {
                log::warn!("line {line}: expecting `key = value`, skipped");
                Ok(())
            };

            if let Err(e) = result {
                log::error!("Scene load aborted: {e}");
                return Err(e);
            }
        }

        loader.finish(last_line).map_err(|e| {
            log::error!("Scene load aborted: {e}");
            e
        })
    }

    /// Read and parse a scene file
    pub fn load_file(path: &str, assets: &mut dyn AssetLoader) -> Result<Scene, SceneFormatError> {
        let text = std::fs::read_to_string(path)?;
        let scene = Self::load_str(&text, assets)?;
        log::info!("Loaded scene `{}` from {path}", scene.name());
        Ok(scene)
    }

    /// Write the scene in its text form
    ///
    /// Only slot nodes are written; links to nodes outside the slots are
    /// dropped with a warning.
    pub fn save_string(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_scene(&mut out);
        out
    }

    /// Write the scene in its text form to any formatter sink
    pub fn write_scene(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let tree = self.tree();

        writeln!(out, "[SCENE \"{}\"]", quoted(self.name()))?;

        for (index, slot) in self.models().iter().enumerate() {
            writeln!(out, "[MODEL {index} \"{}\"]", quoted(&slot.source))?;
        }
        for (index, slot) in self.animation_lists().iter().enumerate() {
            writeln!(out, "[ANIMS {index} \"{}\"]", quoted(&slot.source))?;
        }

        for (index, &id) in self.nodes().iter().enumerate() {
            let Some(node) = tree.node(id) else {
                continue;
            };
            let local = &node.local;
            let r = &local.rotation;

            writeln!(out, "\n[NODE {index} \"{}\"]", quoted(node.name()))?;
            writeln!(
                out,
                "position = {} {} {}",
                local.position.x, local.position.y, local.position.z
            )?;
            writeln!(out, "scale = {} {} {}", local.scale.x, local.scale.y, local.scale.z)?;
            writeln!(
                out,
                "rotation = {} {} {} {} {} {} {} {} {}",
                r[(0, 0)],
                r[(0, 1)],
                r[(0, 2)],
                r[(1, 0)],
                r[(1, 1)],
                r[(1, 2)],
                r[(2, 0)],
                r[(2, 1)],
                r[(2, 2)]
            )?;
            let tint = node.tint;
            writeln!(out, "tint = {} {} {} {}", tint.r, tint.g, tint.b, tint.a)?;

            if let Some(model) = node.model() {
                match self.model_index(model) {
                    Some(slot) => writeln!(out, "model = {slot}")?,
                    None => log::warn!("Model of `{}` is not in a scene slot, not saved", node.name()),
                }
            }
            if let Some(animations) = node.animations() {
                match self.animations_index(animations) {
                    Some(slot) => writeln!(out, "anims = {slot}")?,
                    None => log::warn!("Animations of `{}` are not in a scene slot, not saved", node.name()),
                }
            }
        }

        writeln!(out)?;

        // Attaching prepends, so children are written last-to-first
        for (parent_index, &parent) in self.nodes().iter().enumerate() {
            let mut children: Vec<NodeId> = tree.children(parent).collect();
            children.reverse();
            for child in children {
                let Some(child_index) = self.node_index(child) else {
                    log::warn!("Child of slot {parent_index} is not in a scene slot, not saved");
                    continue;
                };
                match tree.node(child).and_then(|node| node.bone_binding()) {
                    Some(binding) => writeln!(
                        out,
                        "[NodeAttachChildToBone {parent_index} {child_index} \"{}\"]",
                        quoted(&binding.name)
                    )?,
                    None => writeln!(out, "[NodeAttachChild {parent_index} {child_index}]")?,
                }
            }
        }

        let lod_members: Vec<NodeId> = self
            .nodes()
            .iter()
            .filter_map(|&id| tree.node(id).and_then(|node| node.next_lod()))
            .collect();

        // Loading puts every node under the root; LOD members are taken out
        // by their insertion
        for (index, &id) in self.nodes().iter().enumerate() {
            let detached = tree.node(id).is_some_and(|node| node.parent().is_none());
            if detached && !lod_members.contains(&id) {
                writeln!(out, "[NodeDetachBranch {index}]")?;
            }
        }

        for (head_index, &head) in self.nodes().iter().enumerate() {
            if lod_members.contains(&head) {
                continue;
            }
            let mut link = head;
            while let Some(node) = tree.node(link) {
                let Some(next) = node.next_lod() else {
                    break;
                };
                match self.node_index(next) {
                    Some(lod_index) => writeln!(
                        out,
                        "[NodeInsertLOD {head_index} {lod_index} {}]",
                        node.next_distance()
                    )?,
                    None => log::warn!("LOD of slot {head_index} is not in a scene slot, not saved"),
                }
                link = next;
            }
        }

        Ok(())
    }

    /// Write the scene's text form to a file
    pub fn save_file(&self, path: &str) -> Result<(), SceneFormatError> {
        std::fs::write(path, self.save_string())?;
        log::info!("Saved scene `{}` to {path}", self.name());
        Ok(())
    }
}

/// Quotes and line breaks cannot be escaped in the format
fn quoted(text: &str) -> String {
    if !text.contains(['"', '\n', '\r']) {
        return text.to_string();
    }
    log::warn!("Replacing quotes and line breaks in `{}` while saving", text.escape_debug());
    text.replace('"', "'").replace(['\n', '\r'], " ")
}
