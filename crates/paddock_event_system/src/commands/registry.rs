use super::{CommandContext, CommandError};
use async_trait::async_trait;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// Handler executed when a player invokes a command.
///
/// Any `Fn(CommandContext) -> impl Future<Output = Result<(), CommandError>>`
/// closure implements this trait.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    async fn execute(&self, ctx: CommandContext) -> Result<(), CommandError>;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
{
    async fn execute(&self, ctx: CommandContext) -> Result<(), CommandError> {
        (self)(ctx).await
    }
}

/// A command bound under a primary name and any number of aliases.
pub struct CommandBinding {
    name: CompactString,
    aliases: SmallVec<[CompactString; 2]>,
    owner: String,
    handler: Arc<dyn CommandHandler>,
}

impl CommandBinding {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(|alias| alias.as_str())
    }

    /// Plugin that bound the command.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn handler(&self) -> Arc<dyn CommandHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for CommandBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBinding")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("owner", &self.owner)
            .finish()
    }
}

/// Registry of chat commands.
///
/// Every primary name and alias is unique across the registry. Names are
/// matched case-sensitively.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    /// Every name and alias, each pointing at its binding
    by_name: HashMap<CompactString, Arc<CommandBinding>>,
    /// Bindings in registration order
    bindings: Vec<Arc<CommandBinding>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an async closure under `name` and `aliases`.
    ///
    /// See [`CommandRegistry::bind_handler`] for the rules.
    pub fn bind<F, Fut>(
        &mut self,
        name: &str,
        aliases: &[&str],
        owner: &str,
        handler: F,
    ) -> Result<Arc<CommandBinding>, CommandError>
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
    {
        self.bind_handler(name, aliases, owner, Arc::new(handler))
    }

    /// Binds `handler` under `name` and `aliases`.
    ///
    /// Names are trimmed first. Fails without touching the registry when any
    /// name is empty or contains whitespace, already exists, or appears twice
    /// in this binding.
    pub fn bind_handler(
        &mut self,
        name: &str,
        aliases: &[&str],
        owner: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<Arc<CommandBinding>, CommandError> {
        let name = Self::validate_name(name)?;
        let mut aliases_checked: SmallVec<[CompactString; 2]> = SmallVec::new();
        for alias in aliases {
            aliases_checked.push(Self::validate_name(alias)?);
        }

        {
            let mut seen: SmallVec<[&str; 4]> = SmallVec::new();
            for candidate in std::iter::once(&name).chain(aliases_checked.iter()) {
                if seen.contains(&candidate.as_str()) || self.by_name.contains_key(candidate) {
                    error!("❌ {} tried to bind command '{}' which is already taken", owner, candidate);
                    return Err(CommandError::DuplicateCommand {
                        name: candidate.to_string(),
                    });
                }
                seen.push(candidate.as_str());
            }
        }

        let binding = Arc::new(CommandBinding {
            name,
            aliases: aliases_checked,
            owner: owner.to_string(),
            handler,
        });

        self.by_name
            .insert(binding.name.clone(), Arc::clone(&binding));
        for alias in binding.aliases.iter() {
            self.by_name.insert(alias.clone(), Arc::clone(&binding));
        }
        self.bindings.push(Arc::clone(&binding));

        if binding.aliases.is_empty() {
            info!("📝 {} registered command '{}'", owner, binding.name);
        } else {
            info!(
                "📝 {} registered command '{}' (aliases: {})",
                owner,
                binding.name,
                binding.aliases().collect::<Vec<_>>().join(", ")
            );
        }

        Ok(binding)
    }

    fn validate_name(raw: &str) -> Result<CompactString, CommandError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(CommandError::InvalidName(raw.to_string()));
        }
        Ok(CompactString::new(trimmed))
    }

    /// Finds the binding for a primary name or alias.
    pub fn lookup(&self, name: &str) -> Option<Arc<CommandBinding>> {
        self.by_name.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All bindings in registration order, one entry per command.
    pub fn all_commands(&self) -> &[Arc<CommandBinding>] {
        &self.bindings
    }

    /// Number of bound commands, aliases not counted.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
