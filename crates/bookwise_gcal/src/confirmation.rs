// --- File: crates/bookwise_gcal/src/confirmation.rs ---
//! Rendering of the booking confirmation email (plain text + HTML).
//!
//! The copy is French, matching the site the booking flow serves. Sending
//! is the mailer's job; this module only builds the message parts.

/// A rendered confirmation message.
#[derive(Debug, Clone)]
pub struct ConfirmationEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Build the confirmation email for a booked consultation.
///
/// `start_fmt` is the already-formatted local start time shown to the
/// client. The Meet paragraph is omitted entirely when no link exists.
pub fn booking_confirmation(
    name: &str,
    start_fmt: &str,
    meet_link: Option<&str>,
    sender_name: &str,
    contact_address: &str,
) -> ConfirmationEmail {
    let subject = format!("Confirmation de votre rendez-vous – {start_fmt}");

    let meet_text = match meet_link {
        Some(link) => format!("Lien Google Meet : {link}\n\n"),
        None => String::new(),
    };
    let text = format!(
        "Bonjour {name},\n\n\
         Votre rendez-vous est confirmé pour le {start_fmt}.\n\n\
         {meet_text}\
         À bientôt,\n{sender_name}\n{contact_address}\n"
    );

    let meet_html = match meet_link {
        Some(link) => format!(
            "<p><a href='{link}' style='background:#00318D;color:white;padding:10px 20px;\
             border-radius:8px;text-decoration:none;display:inline-block;margin-top:8px;'>\
             Rejoindre Google Meet</a></p>"
        ),
        None => String::new(),
    };
    let html = format!(
        "<html><body style=\"font-family:Arial,sans-serif;color:#222;\">\n\
         <h2 style=\"color:#00318D;\">Rendez-vous confirmé !</h2>\n\
         <p>Bonjour <strong>{name}</strong>,</p>\n\
         <p>Votre session de consultation est confirmée :</p>\n\
         <p style=\"font-size:18px;font-weight:bold;color:#00318D;\">{start_fmt}</p>\n\
         {meet_html}\n\
         <p style=\"margin-top:24px;color:#555;font-size:13px;\">Une question ? Répondez à cet \
         email ou écrivez-nous à <a href=\"mailto:{contact_address}\">{contact_address}</a>.</p>\n\
         <p style=\"color:#555;font-size:13px;\">{sender_name}</p>\n\
         </body></html>"
    );

    ConfirmationEmail {
        subject,
        text,
        html,
    }
}
