use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Text,
    Vision,
    Image,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Vision => "vision",
            Self::Image => "image",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<Capability>,
    pub context_window: Option<u64>,
}

impl ModelSpec {
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_dryrun(&self) -> bool {
        self.provider == "dryrun"
    }
}

/// Known models in preference order; the first model of a capability is its default.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: Capability) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: Capability) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str,
                      provider: &str,
                      capabilities: &[Capability],
                      context_window: Option<u64>| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                provider: provider.to_string(),
                capabilities: capabilities.to_vec(),
                context_window,
            },
        );
    };

    insert(
        "gemini-2.5-flash",
        "gemini",
        &[Capability::Text, Capability::Vision],
        Some(1_048_576),
    );
    insert(
        "gemini-2.5-pro",
        "gemini",
        &[Capability::Text, Capability::Vision],
        Some(1_048_576),
    );
    insert("imagen-3.0-generate-002", "imagen", &[Capability::Image], None);
    insert("imagen-4.0-generate-001", "imagen", &[Capability::Image], None);
    insert(
        "dryrun-text-1",
        "dryrun",
        &[Capability::Text, Capability::Vision],
        Some(8192),
    );
    insert("dryrun-image-1", "dryrun", &[Capability::Image], None);

    map
}
