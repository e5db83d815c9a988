//! Wavefront OBJ/MTL loading.
//!
//! Line-by-line parsing of the subset of OBJ the renderer needs:
//!
//! - `v x y z`, `vt u v`, `vn x y z`
//! - `f a b c ...` with `v`, `v/vt`, `v//vn` and `v/vt/vn` references,
//!   1-based or negative (relative to the end) indices, fan triangulated
//! - `mtllib file.mtl`, `usemtl name`
//!
//! and of MTL: `newmtl`, `Kd`, `Ke`. Malformed numbers read as zero.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lumen_math::Vec3;
use thiserror::Error;

use crate::material::Material;

/// Errors that can occur while loading OBJ geometry.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("No geometry found in {0}")]
    NoGeometry(PathBuf),
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// One fan-triangulated face, in object space.
#[derive(Clone, Debug)]
pub struct ObjTriangle {
    pub positions: [Vec3; 3],
    /// Zero where the face did not reference a normal
    pub normals: [Vec3; 3],
    /// Texture coordinates as (u, v, 0)
    pub uvs: [Vec3; 3],
    pub material: Arc<Material>,
}

/// Triangles read from an OBJ file.
#[derive(Clone, Debug, Default)]
pub struct ObjModel {
    pub triangles: Vec<ObjTriangle>,
}

impl ObjModel {
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Load an OBJ file.
///
/// `parent` is the material used until a `usemtl` selects another one, and
/// the base every `newmtl` starts from. A missing MTL library is not an
/// error; a missing OBJ file is.
pub fn load_obj(path: impl AsRef<Path>, parent: &Material) -> LoadResult<ObjModel> {
    let path = path.as_ref();
    log::info!("Loading OBJ: {}", path.display());

    let file = File::open(path)?;
    let mut parser = ObjParser::new(parent, path.parent().map(Path::to_path_buf));
    for (i, line) in BufReader::new(file).lines().enumerate() {
        parser.parse_line(i + 1, &line?)?;
    }

    let model = parser.finish();
    if model.is_empty() {
        return Err(LoadError::NoGeometry(path.to_path_buf()));
    }
    log::info!("Loaded {} triangles from {}", model.len(), path.display());
    Ok(model)
}

/// Parse OBJ source held in memory. `mtllib` paths resolve against `base_dir`.
pub fn parse_obj(source: &str, base_dir: Option<&Path>, parent: &Material) -> LoadResult<ObjModel> {
    let mut parser = ObjParser::new(parent, base_dir.map(Path::to_path_buf));
    for (i, line) in source.lines().enumerate() {
        parser.parse_line(i + 1, line)?;
    }
    Ok(parser.finish())
}

/// Load an MTL library into `materials`.
///
/// Each `newmtl` starts from a copy of `parent`. A file that does not exist
/// is skipped.
pub fn load_mtl(
    path: impl AsRef<Path>,
    parent: &Material,
    materials: &mut HashMap<String, Arc<Material>>,
) -> LoadResult<()> {
    let path = path.as_ref();
    log::info!("Loading MTL: {}", path.display());

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::warn!("Material library {} not found, keeping parent material", path.display());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        lines.push(line?);
    }
    parse_mtl(lines.iter().map(String::as_str), parent, materials);
    Ok(())
}

/// Parse MTL statements into `materials`.
pub fn parse_mtl<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    parent: &Material,
    materials: &mut HashMap<String, Arc<Material>>,
) {
    // Statements before the first `newmtl` edit a scratch copy.
    let mut name: Option<String> = None;
    let mut current = *parent;

    let mut commit = |name: &Option<String>, material: &Material| {
        if let Some(name) = name {
            materials.insert(name.clone(), Arc::new(*material));
        }
    };

    for line in lines {
        let mut fields = line.split_whitespace();
        let Some(keyword) = fields.next() else {
            continue;
        };
        let args: Vec<&str> = fields.collect();

        match keyword {
            "newmtl" => {
                commit(&name, &current);
                name = args.first().map(|s| s.to_string());
                current = *parent;
            }
            "Kd" => {
                current.color = parse_vec3(&args);
            }
            "Ke" => {
                let c = parse_vec3(&args);
                let max = c.max_element();
                if max > 0.0 {
                    current.color = c / max;
                }
            }
            _ => {}
        }
    }
    commit(&name, &current);
}

/// Streaming OBJ state: attribute pools plus the active material.
struct ObjParser {
    base_dir: Option<PathBuf>,
    parent: Material,
    // Index 0 is a zero placeholder so that 1-based references index directly.
    positions: Vec<Vec3>,
    uvs: Vec<Vec3>,
    normals: Vec<Vec3>,
    materials: HashMap<String, Arc<Material>>,
    material: Arc<Material>,
    triangles: Vec<ObjTriangle>,
}

impl ObjParser {
    fn new(parent: &Material, base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            parent: *parent,
            positions: vec![Vec3::ZERO],
            uvs: vec![Vec3::ZERO],
            normals: vec![Vec3::ZERO],
            materials: HashMap::new(),
            material: Arc::new(*parent),
            triangles: Vec::new(),
        }
    }

    fn parse_line(&mut self, line_no: usize, line: &str) -> LoadResult<()> {
        let mut fields = line.split_whitespace();
        let Some(keyword) = fields.next() else {
            return Ok(());
        };
        let args: Vec<&str> = fields.collect();

        match keyword {
            "mtllib" => {
                let Some(file) = args.first() else {
                    return Ok(());
                };
                let path = match &self.base_dir {
                    Some(dir) => dir.join(file),
                    None => PathBuf::from(file),
                };
                load_mtl(path, &self.parent, &mut self.materials)?;
            }
            "usemtl" => {
                if let Some(material) = args.first().and_then(|name| self.materials.get(*name)) {
                    self.material = Arc::clone(material);
                }
            }
            "v" => self.positions.push(parse_vec3(&args)),
            "vt" => {
                let f = parse_floats(&args);
                self.uvs.push(Vec3::new(component(&f, 0), component(&f, 1), 0.0));
            }
            "vn" => self.normals.push(parse_vec3(&args)),
            "f" => self.parse_face(line_no, &args)?,
            _ => {}
        }
        Ok(())
    }

    fn parse_face(&mut self, line_no: usize, args: &[&str]) -> LoadResult<()> {
        let mut corners = Vec::with_capacity(args.len());
        for arg in args {
            let mut refs = arg.split('/');
            let v = resolve_index(refs.next(), self.positions.len(), line_no)?;
            let vt = resolve_index(refs.next(), self.uvs.len(), line_no)?;
            let vn = resolve_index(refs.next(), self.normals.len(), line_no)?;
            corners.push((v, vt, vn));
        }

        for i in 1..corners.len().saturating_sub(1) {
            let fan = [corners[0], corners[i], corners[i + 1]];
            self.triangles.push(ObjTriangle {
                positions: fan.map(|(v, _, _)| self.positions[v]),
                normals: fan.map(|(_, _, vn)| self.normals[vn]),
                uvs: fan.map(|(_, vt, _)| self.uvs[vt]),
                material: Arc::clone(&self.material),
            });
        }
        Ok(())
    }

    fn finish(self) -> ObjModel {
        ObjModel {
            triangles: self.triangles,
        }
    }
}

/// Resolve one face reference against a pool of `len` entries (placeholder
/// included). Missing or malformed references resolve to the placeholder.
fn resolve_index(value: Option<&str>, len: usize, line: usize) -> LoadResult<usize> {
    let parsed = value.and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);
    let index = if parsed < 0 { parsed + len as i64 } else { parsed };

    if index < 0 || index as usize >= len {
        return Err(LoadError::Parse {
            line,
            message: format!("index {parsed} out of range ({} entries)", len - 1),
        });
    }
    Ok(index as usize)
}

fn parse_floats(args: &[&str]) -> Vec<f64> {
    args.iter().map(|s| s.parse().unwrap_or(0.0)).collect()
}

fn component(values: &[f64], i: usize) -> f64 {
    values.get(i).copied().unwrap_or(0.0)
}

fn parse_vec3(args: &[&str]) -> Vec3 {
    let f = parse_floats(args);
    Vec3::new(component(&f, 0), component(&f, 1), component(&f, 2))
}
