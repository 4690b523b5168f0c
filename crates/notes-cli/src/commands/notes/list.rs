use crate::app::AppContext;
use crate::cli::ListArgs;
use crate::output::{notes_json, print_note_list};

pub async fn handle_list(ctx: &AppContext<'_>, args: &ListArgs) -> anyhow::Result<()> {
    let (session, _local) = ctx.open_session().await?;

    let notes = session.notes().list();
    if args.json {
        let output = serde_json::to_string_pretty(&notes_json(&notes))?;
        println!("{}", output);
    } else {
        print_note_list(&notes, ctx.quiet());
    }

    session.close().await?;
    Ok(())
}
