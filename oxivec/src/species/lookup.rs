use crate::mutators::Layer;
use crate::names;
use crate::{Parameter, ParameterError, ParameterSource};

/// Layered lookups against a parameter source, falling
/// back from the species base to the default base.
pub(crate) struct Lookup<'a, P: ?Sized> {
    params: &'a P,
    base: Parameter,
    default: Parameter,
}

impl<'a, P: ParameterSource + ?Sized> Lookup<'a, P> {
    pub fn new(params: &'a P, base: Parameter) -> Lookup<'a, P> {
        Lookup {
            params,
            base,
            default: Parameter::new(names::DEFAULT_BASE),
        }
    }

    /// Returns the key holding `name` at `layer`: the species
    /// key if set, else the default-base key if set, else the
    /// species key.
    pub fn find(&self, layer: Layer, name: &str) -> Parameter {
        let primary = layer.key(&self.base, name);
        if self.params.exists(&primary) {
            return primary;
        }
        let fallback = layer.key(&self.default, name);
        if self.params.exists(&fallback) {
            fallback
        } else {
            primary
        }
    }

    pub fn string(&self, layer: Layer, name: &str) -> Option<String> {
        self.params.get_string(&self.find(layer, name))
    }

    pub fn f64(&self, layer: Layer, name: &str) -> Result<Option<f64>, ParameterError> {
        self.params.get_f64(&self.find(layer, name))
    }

    pub fn i64(&self, layer: Layer, name: &str) -> Result<Option<i64>, ParameterError> {
        self.params.get_i64(&self.find(layer, name))
    }

    pub fn usize(&self, layer: Layer, name: &str) -> Result<Option<usize>, ParameterError> {
        self.params.get_usize(&self.find(layer, name))
    }

    pub fn bool(&self, layer: Layer, name: &str) -> Result<Option<bool>, ParameterError> {
        self.params.get_bool(&self.find(layer, name))
    }

    /// Looks up a key below the segment prefix that is not a
    /// mutation parameter, such as `segment.<k>.start`.
    pub fn segment_index(&self, segment: usize, which: &str) -> Result<Option<usize>, ParameterError> {
        let path = |base: &Parameter| base.push(names::SEGMENT).push(segment).push(which);
        let primary = path(&self.base);
        let key = if self.params.exists(&primary) {
            primary
        } else {
            path(&self.default)
        };
        self.params.get_usize(&key)
    }
}
