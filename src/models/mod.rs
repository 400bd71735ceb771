pub mod comment;
pub mod complaint;
pub mod support;
pub mod user;

pub use comment::{Entity as Comment, Model as CommentModel};
pub use complaint::{Entity as Complaint, Model as ComplaintModel};
pub use support::{Entity as Support, Model as SupportModel};
pub use user::{Entity as User, Model as UserModel, UserRole};

/// Label used whenever a complaint does not name a company.
pub const UNKNOWN_COMPANY: &str = "Não informada";

/// Work areas offered by default; users may still type their own.
pub const STANDARD_AREAS: [&str; 13] = [
    "Tecnologia",
    "Jurídico",
    "Saúde",
    "Educação",
    "Administrativo",
    "Marketing",
    "Vendas",
    "Financeiro",
    "Recursos Humanos",
    "Engenharia",
    "Design",
    "Comunicação",
    "Outros",
];
