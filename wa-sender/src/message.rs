//! Message templates.

use std::fs;
use std::path::Path;

use crate::errors::SenderError;

/// Placeholder replaced by the recipient's name.
pub const NAME_PLACEHOLDER: &str = "{name}";

pub const CONFIRMATION_LINK: &str = "https://www.alcidesynilda.com/#confirmar";

const DEFAULT_TEMPLATE: &str = "¡Hola *{name}*! 🌟

Te escribo en nombre de *Alcides y Nilda*, quienes están llenos de emoción y alegría por la celebración de su boda el *25 de enero*. 💍✨

Para ayudarlos con la organización, por favor confirma cuántas personas de tu grupo o familia asistirán al evento ingresando al siguiente enlace:

🔗 https://www.alcidesynilda.com/#confirmar

Si lo prefieres, también puedes confirmar por este medio enviándome los siguientes datos:
- Tu nombre completo.
- Los nombres de tus acompañantes mayores de 18 años.

Este día será uno de los momentos más importantes en la vida de Alcides y Nilda, y nos encantaría compartirlo contigo. Tu confirmación es muy importante para que podamos preparar todo con mucho amor y atención a los detalles. 💕

¡Gracias por ser parte de este momento tan especial para ellos! Estamos seguros de que será un día lleno de alegría y felicidad compartida. 🎉

Atentamente,
*Coordinación - Boda Alcides & Nilda*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    body: String,
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self {
            body: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl MessageTemplate {
    /// Builds a template from text containing at least one `{name}`.
    pub fn new(body: impl Into<String>) -> Result<Self, SenderError> {
        let body = body.into();
        if !body.contains(NAME_PLACEHOLDER) {
            return Err(SenderError::InvalidConfig(format!(
                "message template must contain the {NAME_PLACEHOLDER} placeholder"
            )));
        }
        Ok(Self { body })
    }

    pub fn from_file(path: &Path) -> Result<Self, SenderError> {
        let body = fs::read_to_string(path).map_err(|e| {
            SenderError::InvalidConfig(format!(
                "failed to read message template {}: {e}",
                path.display()
            ))
        })?;
        Self::new(body)
    }

    pub fn render(&self, recipient_name: &str) -> String {
        self.body.replace(NAME_PLACEHOLDER, recipient_name)
    }
}

/// Renders the built-in invitation for `recipient_name`.
pub fn compose(recipient_name: &str) -> String {
    MessageTemplate::default().render(recipient_name)
}
