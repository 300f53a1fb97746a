use pomotick_core::SessionStore;

pub fn run(yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !yes {
        return Err("this deletes all session history and settings; pass --yes to confirm".into());
    }
    let mut store = SessionStore::open()?;
    store.clear_all()?;
    println!("all sessions and settings cleared");
    Ok(())
}
