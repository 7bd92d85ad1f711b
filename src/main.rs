use anyhow::Result;
use clap::{Parser, Subcommand};
use freshfood::api::{Api, HttpClient, ImageUpload};
use freshfood::config::Config;
use freshfood::ingredients::IngredientCollection;
use freshfood::logging;
use freshfood::recipes::RecipeBrowser;
use freshfood::shopping::ShoppingList;
use freshfood::staples::Staples;
use freshfood::storage::Storage;
use freshfood::types::{RecipeDetail, RecipeId, RecipeSummary};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "freshfood")]
#[command(version = env!("FRESHFOOD_VERSION"))]
#[command(about = "freshfood: shopping list, leftover ingredients and recipe ideas")]
struct Args {
    /// Backend base URL (overrides config and FRESHFOOD_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory for locally persisted ingredients
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the shopping list
    List,

    /// Add an item to the shopping list
    Add {
        name: String,
        /// Quantity, clamped to 1..=10
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Remove an item from the shopping list
    Remove { id: i64 },

    /// Change the quantity of a shopping list item
    SetQty {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Manage leftover ingredients
    Ingredients {
        #[command(subcommand)]
        action: Option<IngredientsAction>,
    },

    /// Recognize ingredients in a photo and add the chosen ones
    Scan {
        image: PathBuf,
        /// Add every recognized ingredient
        #[arg(long)]
        all: bool,
        /// Add the recognized ingredients at these 1-based positions
        #[arg(long, value_delimiter = ',')]
        pick: Vec<usize>,
    },

    /// Get recipe ideas for the current leftover ingredients
    Recommend {
        /// Also show the full recipe at this rank
        #[arg(long)]
        detail: Option<usize>,
    },

    /// Show one recipe in full
    Recipe { id: String },

    /// Manage staple ingredients
    Staples {
        #[command(subcommand)]
        action: Option<StaplesAction>,
    },

    /// Write a default config file
    Init,
}

#[derive(Subcommand, Debug)]
enum IngredientsAction {
    List,
    Add { name: String },
    Remove { id: u32 },
}

#[derive(Subcommand, Debug)]
enum StaplesAction {
    List,
    Add { name: String },
    Remove { name: String },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    logging::cleanup_old_logs();
    logging::info("freshfood starting");

    let args = Args::parse();

    if let Err(e) = run_main(args).await {
        logging::error(&format!("{:?}", e));
        let message = e
            .downcast_ref::<freshfood::Error>()
            .map(|err| err.user_message())
            .unwrap_or_else(|| format!("{:#}", e));
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }
    Ok(())
}

async fn run_main(args: Args) -> Result<()> {
    let mut config = Config::load();
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }
    if let Some(dir) = args.state_dir {
        config.storage.dir = Some(dir);
    }

    let api: Arc<dyn Api> = Arc::new(HttpClient::new(config.api.clone())?);
    let storage = Storage::new(config.storage.resolved_dir()?);

    match args.command {
        Command::List => {
            let mut list = ShoppingList::new(api);
            list.fetch().await?;
            print_shopping_list(&list);
        }
        Command::Add { name, quantity } => {
            let mut list = ShoppingList::new(api);
            let item = list.add(&name, quantity).await?;
            println!("Added #{} {} x{}", item.id, item.name, item.quantity);
        }
        Command::Remove { id } => {
            let mut list = ShoppingList::new(api);
            list.fetch().await?;
            if list.get(id).is_none() {
                println!("No item #{} on the list", id);
                return Ok(());
            }
            list.delete(id).await?;
            print_shopping_list(&list);
        }
        Command::SetQty { id, quantity } => {
            let mut list = ShoppingList::new(api);
            list.fetch().await?;
            let item = list.update_quantity(id, quantity).await?;
            println!("#{} {} x{}", item.id, item.name, item.quantity);
        }
        Command::Ingredients { action } => {
            let mut collection = IngredientCollection::open(api, storage).await;
            match action.unwrap_or(IngredientsAction::List) {
                IngredientsAction::List => {}
                IngredientsAction::Add { name } => {
                    collection.add(&name).await?;
                }
                IngredientsAction::Remove { id } => {
                    collection.remove(id).await?;
                }
            }
            print_ingredients(&collection);
        }
        Command::Scan { image, all, pick } => {
            let picked = pick_indices(&pick)?;
            let upload = ImageUpload::from_path(&image).await?;
            let mut collection = IngredientCollection::open(api, storage).await;
            let staged = collection.upload(&upload).await?;
            if staged.is_empty() {
                println!("No ingredients recognized. Please try again.");
                collection.cancel_selection();
                return Ok(());
            }

            println!("Ingredients recognized:");
            for (i, entry) in staged.iter().enumerate() {
                println!("  {}. {}", i + 1, entry.name);
            }

            if all {
                collection.select_all();
            } else if !picked.is_empty() {
                for index in picked {
                    collection.toggle(index)?;
                }
            } else {
                collection.cancel_selection();
                println!("Nothing added. Use --all or --pick 1,2 to choose.");
                return Ok(());
            }

            let added = collection.confirm().await?;
            println!("Added {} new ingredient(s)", added.len());
            print_ingredients(&collection);
        }
        Command::Recommend { detail } => {
            let mut collection = IngredientCollection::open(api.clone(), storage).await;
            let recipes = collection.recommend().await?;
            let browser = RecipeBrowser::new(api, recipes);
            if browser.is_empty() {
                println!("No recipes found.");
                return Ok(());
            }
            for (i, recipe) in browser.recipes().iter().enumerate() {
                print_recipe_summary(i + 1, recipe);
            }
            if let Some(rank) = detail {
                let Some(summary) = browser.by_rank(rank) else {
                    println!("No recipe at rank {}", rank);
                    return Ok(());
                };
                let recipe_id = summary.recipe_id.clone();
                let detail = browser.fetch_detail(&recipe_id).await?;
                print_recipe_detail(&detail);
            }
        }
        Command::Recipe { id } => {
            let browser = RecipeBrowser::new(api, Vec::new());
            let detail = browser.fetch_detail(&RecipeId::new(id)).await?;
            print_recipe_detail(&detail);
        }
        Command::Staples { action } => {
            let mut staples = Staples::new(api);
            match action.unwrap_or(StaplesAction::List) {
                StaplesAction::List => {
                    staples.fetch().await?;
                }
                StaplesAction::Add { name } => {
                    staples.add(&name).await?;
                    println!("{} added to staples.", name.trim());
                }
                StaplesAction::Remove { name } => {
                    staples.remove(&name).await?;
                }
                StaplesAction::Clear => {
                    staples.clear().await?;
                }
            }
            if staples.names().is_empty() {
                println!("No staple ingredients.");
            }
            for name in staples.names() {
                println!("  - {}", name);
            }
        }
        Command::Init => {
            let path = Config::create_default_config_file()?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

/// Turn 1-based `--pick` positions into unique 0-based indices, in order.
fn pick_indices(positions: &[usize]) -> freshfood::Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(positions.len());
    for &position in positions {
        let index = position
            .checked_sub(1)
            .ok_or_else(|| freshfood::Error::validation("Positions start at 1"))?;
        if !indices.contains(&index) {
            indices.push(index);
        }
    }
    Ok(indices)
}

fn print_shopping_list(list: &ShoppingList<dyn Api>) {
    if list.items().is_empty() {
        println!("Your shopping list is empty.");
        return;
    }
    for item in list.items() {
        println!("  #{:<4} {:<24} x{}", item.id, item.name, item.quantity);
    }
}

fn print_ingredients(collection: &IngredientCollection<dyn Api>) {
    if collection.ingredients().is_empty() {
        println!("No ingredients added yet");
        return;
    }
    for ingredient in collection.ingredients() {
        println!("  {:>3}. {}", ingredient.id, ingredient.name);
    }
}

fn minutes(value: Option<u32>) -> String {
    value
        .map(|m| format!("{} mins", m))
        .unwrap_or_else(|| "-".to_string())
}

fn print_recipe_summary(rank: usize, recipe: &RecipeSummary) {
    println!(
        "{}. {} [{}] ({:.0}% match, prep {}, cook {})",
        rank,
        recipe.recipe_name,
        recipe.recipe_id,
        recipe.match_display(),
        minutes(recipe.preparation_time),
        minutes(recipe.cooking_time)
    );
    if !recipe.matched_ingredients.is_empty() {
        println!("     have: {}", recipe.matched_ingredients.join(", "));
    }
    if !recipe.missing_ingredients.is_empty() {
        println!("     need: {}", recipe.missing_ingredients.join(", "));
    }
}

fn print_recipe_detail(recipe: &RecipeDetail) {
    println!("\n{}", recipe.recipe_name);
    if !recipe.recipe_description.is_empty() {
        println!("{}", recipe.recipe_description);
    }
    println!(
        "Prep {} | Cook {} | Serving {}",
        minutes(recipe.preparation_time),
        minutes(recipe.cooking_time),
        recipe.serving_size.as_deref().unwrap_or("-")
    );
    if let Some(url) = recipe.image_url() {
        println!("Image: {}", url);
    }

    println!("\nIngredients:");
    for ingredient in &recipe.ingredients {
        println!("  - {} {}", ingredient.food_name, ingredient.ingredient_description);
    }

    println!("\nDirections:");
    for direction in &recipe.directions {
        println!("  {}. {}", direction.direction_number, direction.direction_description);
    }

    let n = &recipe.nutritional_info;
    let fmt = |v: Option<f64>| v.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string());
    println!("\nNutrition:");
    println!(
        "  Calories {} kcal | Protein {} g | Carbs {} g | Fat {} g | Fiber {} g | Sugar {} g",
        fmt(n.calories),
        fmt(n.protein),
        fmt(n.carbohydrate),
        fmt(n.fat),
        fmt(n.fiber),
        fmt(n.sugar)
    );
    if let Some(size) = &n.serving_size {
        println!("  Per {}", size);
    }
}
