/// User-facing messages in every supported language

use super::Language;

/// A user-facing message
///
/// Each variant has a text per [`Language`]. Use [`Message::localized`] in
/// request handlers and [`Message::text`] where the language is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    // Tokens
    TokenExpired,
    TokenInvalid,
    TokenInvalidHeader,
    TokenInvalidType,
    TokenInvalidStructure,
    TokenNotRevoked,
    TokensGenerated,
    TokensRefreshed,
    TokensRevoked,
    MissingAuthorizationHeader,
    NotBasicToken,
    InvalidCredentials,
    AuthServiceUnavailable,

    GenericError,
    NoDataProvided,

    // Todos
    TodoNotFound,
    TodoCreateError,
    TodoDeleted,

    // Users
    UserNotFound,
    UserCreated,
    UserUpdated,
    UserDeleted,
    UserCreateError,
    UserInactive,
    NotAuthorized,
    EmailExists,
    UsernameExists,
    EmailInvalid,
    PasswordTooWeak,

    // Roles and permissions
    RoleExists,
    RoleNotFound,
    RoleNotCreated,
    RoleNotDeleted,
    PermissionNotFound,
    PermissionDenied,
    OnlyModerators,
    OnlyAdmin,
}

impl Message {
    /// Text in the current request's language
    pub fn localized(&self) -> &'static str {
        self.text(super::current())
    }

    pub fn text(&self, language: Language) -> &'static str {
        let (en_us, pt_br) = self.texts();
        match language {
            Language::EnUs => en_us,
            Language::PtBr => pt_br,
        }
    }

    fn texts(&self) -> (&'static str, &'static str) {
        match self {
            Message::TokenExpired => ("Token has expired.", "Token expirado."),
            Message::TokenInvalid => ("Invalid token.", "Token inválido."),
            Message::TokenInvalidHeader => ("Invalid token header.", "Cabeçalho de token inválido."),
            Message::TokenInvalidType => ("Invalid token type.", "Tipo de token inválido."),
            Message::TokenInvalidStructure => {
                ("Invalid token structure.", "Estrutura do token inválida.")
            }
            Message::TokenNotRevoked => ("Token not revoked.", "Token não revogado."),
            Message::TokensGenerated => {
                ("Tokens generated successfully.", "Tokens gerados com sucesso.")
            }
            Message::TokensRefreshed => {
                ("Tokens refreshed successfully.", "Tokens atualizados com sucesso.")
            }
            Message::TokensRevoked => ("Tokens revoked successfully.", "Tokens revogados com sucesso."),
            Message::MissingAuthorizationHeader => {
                ("Missing Authorization header.", "Cabeçalho de autorização ausente.")
            }
            Message::NotBasicToken => (
                "Authorization header must be a Basic token.",
                "O cabeçalho de autorização deve ser um token Basic.",
            ),
            Message::InvalidCredentials => ("Invalid credentials.", "Credenciais inválidas."),
            Message::AuthServiceUnavailable => (
                "Authentication service unavailable.",
                "Serviço de autenticação indisponível.",
            ),
            Message::GenericError => (
                "An error occurred. Please try again later.",
                "Ocorreu um erro. Por favor, tente novamente mais tarde.",
            ),
            Message::NoDataProvided => ("No data provided.", "Nenhum dado fornecido."),
            Message::TodoNotFound => ("Todo not found.", "Todo não encontrado."),
            Message::TodoCreateError => ("Error creating todo.", "Erro ao criar todo."),
            Message::TodoDeleted => ("Todo deleted successfully.", "Todo deletado com sucesso."),
            Message::UserNotFound => ("User not found.", "Usuário não encontrado."),
            Message::UserCreated => ("User created successfully.", "Usuário criado com sucesso."),
            Message::UserUpdated => ("User updated successfully.", "Usuário atualizado com sucesso."),
            Message::UserDeleted => ("User deleted successfully.", "Usuário deletado com sucesso."),
            Message::UserCreateError => ("Error creating user.", "Erro ao criar usuário."),
            Message::UserInactive => (
                "User account is inactive. Activate it through your email.",
                "A conta do usuário está inativa. Ative-a através do seu email.",
            ),
            Message::NotAuthorized => (
                "You don't have permission to access this.",
                "Você não tem permissão para acessar isso.",
            ),
            Message::EmailExists => ("Email already exists.", "Email já existe."),
            Message::UsernameExists => ("Username already exists.", "Nome de usuário já existe."),
            Message::EmailInvalid => ("Email is invalid.", "Email inválido."),
            Message::PasswordTooWeak => (
                "Password is too weak. It must be at least 6 characters long and contain at least one letter and one number.",
                "A senha é muito fraca. Deve ter pelo menos 6 caracteres e conter pelo menos uma letra e um número.",
            ),
            Message::RoleExists => ("Role already exists.", "Designação já existe."),
            Message::RoleNotFound => ("Role not found.", "Designação não encontrado."),
            Message::RoleNotCreated => ("Role not created.", "Designação não criada."),
            Message::RoleNotDeleted => ("Role not deleted.", "Designação não deletada."),
            Message::PermissionNotFound => ("Permission not found.", "Permissão não encontrada."),
            Message::PermissionDenied => ("Permission denied.", "Permissão negada."),
            Message::OnlyModerators => (
                "Only moderators or above can perform this action.",
                "Apenas moderadores ou superiores podem realizar esta ação.",
            ),
            Message::OnlyAdmin => (
                "Only admins can perform this action.",
                "Apenas administradores podem realizar esta ação.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_per_language() {
        assert_eq!(Message::TokenExpired.text(Language::EnUs), "Token has expired.");
        assert_eq!(Message::TokenExpired.text(Language::PtBr), "Token expirado.");
        assert_eq!(Message::RoleNotFound.text(Language::PtBr), "Designação não encontrado.");
    }

    #[test]
    fn test_localized_defaults_to_english() {
        assert_eq!(Message::UserNotFound.localized(), "User not found.");
    }

    #[tokio::test]
    async fn test_localized_follows_scope() {
        let text = crate::locale::scope(Language::PtBr, async {
            Message::InvalidCredentials.localized()
        })
        .await;
        assert_eq!(text, "Credenciais inválidas.");
    }
}
