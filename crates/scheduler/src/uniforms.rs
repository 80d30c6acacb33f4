//! Uniform synchronization contract shared by the host loop and the renderer.
//!
//! A shader variant declares an ordered list of uniform names; the host must
//! supply a value for every declared name before each submission. The
//! declared order is load-bearing: a uniform's position in the list is its
//! binding index in group 0, so the tables here must stay bit-exact with the
//! WGSL sources in the renderer crate.

use thiserror::Error;

/// Which of the two fragment shaders a run drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderVariant {
    /// Fractal-noise background with a single-channel feedback trail.
    NoiseFeedback,
    /// Noise-driven horizontal warp of the video feed with interference.
    VideoWarp,
}

impl ShaderVariant {
    /// The uniform declarations for this variant, in binding order.
    pub fn descriptor(self) -> RenderDescriptor {
        match self {
            ShaderVariant::NoiseFeedback => {
                const DECLS: &[UniformDecl] = &[
                    UniformDecl::new("frame", UniformKind::Scalar),
                    UniformDecl::new("res", UniformKind::Vec2),
                    UniformDecl::new("audio", UniformKind::Vec3),
                    UniformDecl::new("mouse", UniformKind::Vec3),
                ];
                RenderDescriptor { uniforms: DECLS }
            }
            ShaderVariant::VideoWarp => {
                const DECLS: &[UniformDecl] = &[
                    UniformDecl::new("frame", UniformKind::Scalar),
                    UniformDecl::new("res", UniformKind::Vec2),
                    UniformDecl::new("speed", UniformKind::Scalar),
                    UniformDecl::new("largeWaveStrength", UniformKind::Scalar),
                    UniformDecl::new("smallWaveStrength", UniformKind::Scalar),
                    UniformDecl::new("interferenceStrength", UniformKind::Scalar),
                ];
                RenderDescriptor { uniforms: DECLS }
            }
        }
    }
}

impl std::fmt::Display for ShaderVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderVariant::NoiseFeedback => f.write_str("feedback"),
            ShaderVariant::VideoWarp => f.write_str("warp"),
        }
    }
}

/// Value shape of a declared uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Scalar,
    Vec2,
    Vec3,
}

impl UniformKind {
    /// Payload size in bytes when written to a GPU buffer.
    pub fn byte_len(self) -> usize {
        match self {
            UniformKind::Scalar => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
        }
    }
}

/// One entry of a variant's declared uniform list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: &'static str,
    pub kind: UniformKind,
}

impl UniformDecl {
    pub const fn new(name: &'static str, kind: UniformKind) -> Self {
        Self { name, kind }
    }
}

/// Ordered uniform declarations for one shader variant.
///
/// Samplers and textures are bound separately by the renderer; only plain
/// uniform values flow through this table.
#[derive(Debug, Clone, Copy)]
pub struct RenderDescriptor {
    pub uniforms: &'static [UniformDecl],
}

impl RenderDescriptor {
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.uniforms.iter().map(|decl| decl.name)
    }
}

/// A typed uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Scalar(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Scalar(_) => UniformKind::Scalar,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
        }
    }

    /// The value as a flat f32 slice, for upload.
    pub fn components(&self) -> &[f32] {
        match self {
            UniformValue::Scalar(v) => std::slice::from_ref(v),
            UniformValue::Vec2(v) => v,
            UniformValue::Vec3(v) => v,
        }
    }
}

/// Setup-time contract violations. These fail the run; they are never
/// tolerated at tick time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("declared uniform '{0}' has no entry in the uniform set")]
    MissingUniform(&'static str),
    #[error("uniform '{name}' declared as {expected:?} but supplied as {found:?}")]
    KindMismatch {
        name: &'static str,
        expected: UniformKind,
        found: UniformKind,
    },
}

/// Snapshot of named uniform values for one submission.
///
/// Created once at setup with the declared defaults, then replaced (not
/// mutated in place) by the scheduler every tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    entries: Vec<(&'static str, UniformValue)>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value for `name`.
    pub fn set(&mut self, name: &'static str, value: UniformValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that every declared name is present with the declared kind.
    ///
    /// Runs at setup, before the first submission; a failure is a
    /// configuration error and aborts the run.
    pub fn validate(&self, descriptor: &RenderDescriptor) -> Result<(), ContractError> {
        for decl in descriptor.uniforms {
            match self.get(decl.name) {
                None => return Err(ContractError::MissingUniform(decl.name)),
                Some(value) if value.kind() != decl.kind => {
                    return Err(ContractError::KindMismatch {
                        name: decl.name,
                        expected: decl.kind,
                        found: value.kind(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_descriptor_matches_binding_table() {
        let descriptor = ShaderVariant::NoiseFeedback.descriptor();
        let names: Vec<_> = descriptor.names().collect();
        assert_eq!(names, ["frame", "res", "audio", "mouse"]);
        assert_eq!(descriptor.uniforms[0].kind, UniformKind::Scalar);
        assert_eq!(descriptor.uniforms[1].kind, UniformKind::Vec2);
        assert_eq!(descriptor.uniforms[2].kind, UniformKind::Vec3);
        assert_eq!(descriptor.uniforms[3].kind, UniformKind::Vec3);
    }

    #[test]
    fn warp_descriptor_matches_binding_table() {
        let descriptor = ShaderVariant::VideoWarp.descriptor();
        let names: Vec<_> = descriptor.names().collect();
        assert_eq!(
            names,
            [
                "frame",
                "res",
                "speed",
                "largeWaveStrength",
                "smallWaveStrength",
                "interferenceStrength"
            ]
        );
        assert!(descriptor.uniforms[2..]
            .iter()
            .all(|decl| decl.kind == UniformKind::Scalar));
    }

    #[test]
    fn missing_declared_name_is_a_configuration_error() {
        let mut set = UniformSet::new();
        set.set("frame", UniformValue::Scalar(0.0));
        set.set("res", UniformValue::Vec2([640.0, 480.0]));
        set.set("audio", UniformValue::Vec3([0.0; 3]));
        // "mouse" deliberately absent.
        let err = set
            .validate(&ShaderVariant::NoiseFeedback.descriptor())
            .unwrap_err();
        assert_eq!(err, ContractError::MissingUniform("mouse"));
    }

    #[test]
    fn kind_mismatch_is_a_configuration_error() {
        let mut set = UniformSet::new();
        set.set("frame", UniformValue::Vec2([0.0, 0.0]));
        set.set("res", UniformValue::Vec2([640.0, 480.0]));
        set.set("audio", UniformValue::Vec3([0.0; 3]));
        set.set("mouse", UniformValue::Vec3([0.0; 3]));
        let err = set
            .validate(&ShaderVariant::NoiseFeedback.descriptor())
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::KindMismatch {
                name: "frame",
                expected: UniformKind::Scalar,
                found: UniformKind::Vec2,
            }
        );
    }

    #[test]
    fn set_replaces_existing_entries_without_growing() {
        let mut set = UniformSet::new();
        set.set("frame", UniformValue::Scalar(0.0));
        set.set("frame", UniformValue::Scalar(7.0));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("frame"), Some(&UniformValue::Scalar(7.0)));
    }

    #[test]
    fn byte_lengths_cover_all_kinds() {
        assert_eq!(UniformKind::Scalar.byte_len(), 4);
        assert_eq!(UniformKind::Vec2.byte_len(), 8);
        assert_eq!(UniformKind::Vec3.byte_len(), 12);
    }
}
