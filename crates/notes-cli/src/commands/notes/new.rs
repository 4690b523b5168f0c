use notes_core::TextEditor;

use crate::app::AppContext;
use crate::cli::NewArgs;

pub async fn handle_new(ctx: &AppContext<'_>, args: &NewArgs) -> anyhow::Result<()> {
    let (mut session, _local) = ctx.open_session().await?;

    let id = session.notes_mut().create_note().id;
    if let Some(text) = args.text.as_deref() {
        let mut editor = TextEditor::new();
        let update = editor.set_text(text);
        session.notes_mut().apply(update)?;
    }

    ctx.finish(session).await?;

    if ctx.quiet() {
        println!("{}", id);
    } else {
        println!("Created note {}", id);
    }
    Ok(())
}
